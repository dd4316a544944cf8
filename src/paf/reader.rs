use crate::error::{DemuxError, Result};
use crate::types::{AdapterDefinition, AlignmentRecord, Strand};
use csv::StringRecord;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;

/// Hits with a mapping quality below this never reach the layout
pub const MIN_MAPQ: u32 = 10;

/// Marker of the cs tag, always the last PAF column
pub const CS_TAG: &str = "cs:Z:";

const READ_ID_COL: usize = 0;
const READ_LEN_COL: usize = 1;
const START_COL: usize = 2;
const END_COL: usize = 3;
const STRAND_COL: usize = 4;
const TARGET_COL: usize = 5;
const MAPQ_COL: usize = 11;
const MIN_COLUMNS: usize = 13;

/// A PAF line that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordParseWarning {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for RecordParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub lines: usize,
    pub kept: usize,
    pub low_quality: usize,
}

/// Hits grouped per read, reads in the order they first appear
#[derive(Debug, Default)]
pub struct LoadedAlignments {
    pub reads: Vec<(String, Vec<AlignmentRecord>)>,
    pub warnings: Vec<RecordParseWarning>,
    pub stats: LoadStats,
}

impl LoadedAlignments {
    pub fn n_reads(&self) -> usize {
        self.reads.len()
    }
}

fn field<'a>(record: &'a StringRecord, col: usize, name: &str) -> std::result::Result<&'a str, String> {
    record
        .get(col)
        .ok_or_else(|| format!("missing {name} column ({} columns)", record.len()))
}

fn int_field<T: std::str::FromStr>(
    record: &StringRecord,
    col: usize,
    name: &str,
) -> std::result::Result<T, String> {
    let raw = field(record, col, name)?;
    raw.parse()
        .map_err(|_| format!("{name} '{raw}' is not a valid integer"))
}

/// Parse one PAF line into an alignment record
pub fn parse_record(record: &StringRecord) -> std::result::Result<AlignmentRecord, String> {
    if record.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {MIN_COLUMNS} columns, found {}",
            record.len()
        ));
    }

    let strand_raw = field(record, STRAND_COL, "strand")?;
    let strand =
        Strand::from_paf(strand_raw).ok_or_else(|| format!("invalid strand '{strand_raw}'"))?;

    let last = record.get(record.len() - 1).unwrap_or_default();
    let cs = last
        .strip_prefix(CS_TAG)
        .ok_or_else(|| format!("last column '{last}' is not a cs tag"))?;

    Ok(AlignmentRecord {
        read_id: field(record, READ_ID_COL, "read id")?.to_string(),
        adapter: field(record, TARGET_COL, "target name")?.to_string(),
        read_len: int_field(record, READ_LEN_COL, "read length")?,
        start: int_field(record, START_COL, "start")?,
        end: int_field(record, END_COL, "end")?,
        strand,
        cs: cs.to_string(),
        quality: int_field(record, MAPQ_COL, "mapping quality")?,
        index_seq: None,
    })
}

/// Shape check on the first line: the cs tag has to be there and the hit has
/// to be against one of the adapter's index templates
pub fn validate_first_record(
    record: &StringRecord,
    adapter: &AdapterDefinition,
    path: &str,
) -> Result<()> {
    let last = record.get(record.len().saturating_sub(1)).unwrap_or_default();
    if record.len() < MIN_COLUMNS || !last.starts_with(CS_TAG) {
        return Err(DemuxError::malformed(
            path,
            "not a valid PAF file or no cs:Z tag (run minimap2 with --cs)",
        ));
    }

    let target = record.get(TARGET_COL).unwrap_or_default();
    let (i5_name, i7_name) = (adapter.i5_name(), adapter.i7_name());
    if target != i5_name && target != i7_name {
        return Err(DemuxError::malformed(
            path,
            format!("aligned to '{target}', expected '{i5_name}' or '{i7_name}'"),
        ));
    }
    Ok(())
}

/// Read PAF hits from any reader, see [`load_alignments`]
pub fn load_alignments_from<R: Read>(
    reader: R,
    adapter: &AdapterDefinition,
    path: &str,
) -> Result<LoadedAlignments> {
    let mut paf = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut loaded = LoadedAlignments::default();
    let mut read_idx: HashMap<String, usize> = HashMap::new();
    let mut record = StringRecord::new();

    while paf.read_record(&mut record)? {
        loaded.stats.lines += 1;
        if loaded.stats.lines == 1 {
            validate_first_record(&record, adapter, path)?;
        }
        // blank lines are skipped by the reader, report the line in the file
        let line = record
            .position()
            .map_or(loaded.stats.lines, |p| p.line() as usize);

        let hit = match parse_record(&record) {
            Ok(hit) => hit,
            Err(reason) => {
                loaded.warnings.push(RecordParseWarning { line, reason });
                continue;
            }
        };

        if hit.quality < MIN_MAPQ {
            loaded.stats.low_quality += 1;
            continue;
        }

        loaded.stats.kept += 1;
        match read_idx.get(&hit.read_id) {
            Some(&i) => loaded.reads[i].1.push(hit),
            None => {
                read_idx.insert(hit.read_id.clone(), loaded.reads.len());
                loaded.reads.push((hit.read_id.clone(), vec![hit]));
            }
        }
    }

    if loaded.stats.lines == 0 {
        return Err(DemuxError::malformed(path, "file contains no alignment records"));
    }

    Ok(loaded)
}

/// Load the adapter hits of a PAF file, keeping those with mapping quality >= 10
pub fn load_alignments(path: &str, adapter: &AdapterDefinition) -> Result<LoadedAlignments> {
    let file = File::open(path)?;
    load_alignments_from(file, adapter, path)
}
