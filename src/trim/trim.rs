use crate::error::{DemuxError, Result};
use crate::io::io::{open_fastq, GzFastqWriter};
use crate::types::{DemuxResult, InsertInterval};
use indicatif::{ProgressBar, ProgressStyle};
use seq_io::fastq::{Reader, Record};
use std::io::{Read, Write};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub total_reads: usize,
    pub demuxed_reads: usize,
    pub written_records: usize,
    pub invalid_intervals: usize,
}

/// First whitespace separated token of a FASTQ header
fn clean_read_id(head: &[u8]) -> &[u8] {
    head.split(|b| b.is_ascii_whitespace())
        .find(|t| !t.is_empty())
        .unwrap_or(head)
}

fn header_tokens(head: &[u8]) -> Vec<&[u8]> {
    head.split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Cut `interval` out of a read, both sequence and quality
pub fn slice_interval<'a>(
    seq: &'a [u8],
    qual: &'a [u8],
    interval: &InsertInterval,
) -> Result<(&'a [u8], &'a [u8])> {
    match interval.slice_range(seq.len()) {
        Some(range) => Ok((&seq[range.clone()], &qual[range])),
        None => Err(DemuxError::InvalidInterval {
            read_id: interval.read_id.clone(),
            label: interval.label.clone(),
            start: interval.start,
            end: interval.end,
            read_len: seq.len(),
        }),
    }
}

fn write_record<W: Write>(writer: &mut W, name: &[u8], rest: &[&[u8]], seq: &[u8], qual: &[u8]) -> std::io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(name)?;
    for token in rest {
        writer.write_all(b" ")?;
        writer.write_all(token)?;
    }
    writer.write_all(b"\n")?;
    writer.write_all(seq)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")
}

/// One pass over the reads, writing every accepted interval of a read as its
/// own record. The name suffix accumulates, so the second insert of `r1` is
/// written as `r1_insert_0_insert_2`. Intervals that do not fit the read are
/// skipped and handed to `on_invalid`.
pub fn extract_intervals<R: Read, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut W,
    result: &DemuxResult,
    mut on_invalid: impl FnMut(&DemuxError),
    mut on_record: impl FnMut(),
) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();

    while let Some(record) = reader.next() {
        let record = record.map_err(|e| match e {
            seq_io::fastq::Error::Io(e) => DemuxError::stream("decompression", e),
            e => DemuxError::Fastq(e),
        })?;
        stats.total_reads += 1;
        on_record();

        let head = record.head();
        let read_id = String::from_utf8_lossy(clean_read_id(head));
        let Some(intervals) = result.get(&read_id) else {
            continue;
        };

        let (seq, qual) = (record.seq(), record.qual());
        if seq.len() != qual.len() {
            return Err(DemuxError::InvalidFastq {
                id: read_id.into_owned(),
                reason: format!(
                    "sequence length {} differs from quality length {}",
                    seq.len(),
                    qual.len()
                ),
            });
        }

        stats.demuxed_reads += 1;
        let tokens = header_tokens(head);
        let mut name = tokens.first().copied().unwrap_or_default().to_vec();

        for interval in intervals {
            name.push(b'_');
            name.extend_from_slice(interval.label.as_bytes());

            let (sub_seq, sub_qual) = match slice_interval(seq, qual, interval) {
                Ok(slices) => slices,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    stats.invalid_intervals += 1;
                    on_invalid(&e);
                    continue;
                }
            };

            write_record(writer, &name, tokens.get(1..).unwrap_or_default(), sub_seq, sub_qual)
                .map_err(|e| DemuxError::stream("compression", e))?;
            stats.written_records += 1;
        }
    }

    Ok(stats)
}

/// Extract the inserts of `result` from `fastq_in` into gzip compressed `fastq_out`
pub fn write_demuxed_fastq(
    result: &DemuxResult,
    fastq_in: &str,
    fastq_out: &str,
    mut on_invalid: impl FnMut(&DemuxError),
) -> Result<ExtractStats> {
    let mut reader = open_fastq(fastq_in)?;
    let mut writer = GzFastqWriter::create(fastq_out)?;

    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.blue} {prefix:<12} {pos:>10} {elapsed_precise}")
    {
        progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    progress_bar.set_prefix("Reads:");

    let stats = extract_intervals(&mut reader, &mut writer, result, &mut on_invalid, || {
        progress_bar.inc(1)
    })?;
    writer.finish()?;

    progress_bar.finish_with_message("Done!");
    Ok(stats)
}
