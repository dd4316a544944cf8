use crate::error::{DemuxError, Result};
use crate::layout::{build_layouts, resolve_layouts, LayoutSummary};
use crate::paf::load_alignments;
use crate::progress::{print_adapter_info, print_header, print_summary_stats, ProgressTracker};
use crate::trim::trim::{write_demuxed_fastq, ExtractStats};
use crate::types::{AdapterDefinition, DemuxResult};
use std::fs::File;
use std::io::BufWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemuxConfig {
    pub max_distance: usize,
    pub verbose: bool,
    pub count_only: bool,
    pub report_partial: bool,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_distance: 1,
            verbose: false,
            count_only: false,
            report_partial: false,
        }
    }
}

impl DemuxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Only report counts, do not touch the reads
    pub fn with_count_only(mut self, count_only: bool) -> Self {
        self.count_only = count_only;
        self
    }

    /// Count reads where a rejected pair still had one matched index.
    /// Off by default, the count is then always reported as zero.
    pub fn with_partial_report(mut self, report_partial: bool) -> Self {
        self.report_partial = report_partial;
        self
    }
}

/// Files of one demux run
#[derive(Debug, Clone)]
pub struct DemuxJob {
    pub paf: String,
    pub reads: String,
    pub output: Option<String>,
    pub bed: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DemuxSummary {
    pub alignment_lines: usize,
    pub kept_alignments: usize,
    pub low_quality: usize,
    pub malformed_lines: usize,
    pub cs_errors: usize,
    pub reads: usize,
    pub intervals: usize,
    pub layout: LayoutSummary,
    pub extract: Option<ExtractStats>,
}

/// Accepted intervals as BED, reads in the order of the alignment file
pub fn write_bed(result: &DemuxResult, path: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(BufWriter::new(File::create(path)?));

    for (_, intervals) in result.iter() {
        for interval in intervals {
            writer.serialize(interval)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Find the inserts between adapter hits and write them out, see [`DemuxConfig`]
/// for the knobs. Nothing is written when the alignment file fails validation.
pub fn run_demux(
    job: &DemuxJob,
    adapter: &AdapterDefinition,
    config: &DemuxConfig,
) -> Result<(DemuxResult, DemuxSummary)> {
    let output = match (&job.output, config.count_only) {
        (_, true) => None,
        (Some(output), false) => Some(output.as_str()),
        (None, false) => {
            return Err(DemuxError::InvalidParameter {
                parameter: "output".to_string(),
                reason: "an output path is required unless only counting".to_string(),
            });
        }
    };

    let mut progress = ProgressTracker::new().with_verbose(config.verbose);
    let mut summary = DemuxSummary::default();
    print_header("Adapter Demultiplexing");

    progress.step("Configuration");
    progress.indent();
    progress.substep(&format!("Alignments: {}", job.paf));
    progress.substep(&format!("Reads: {}", job.reads));
    match output {
        Some(output) => progress.substep(&format!("Output: {output}")),
        None => progress.substep("Output: none, counting only"),
    }
    progress.substep(&format!("Max index distance: {}", config.max_distance));
    if config.verbose {
        progress.substep("Debug mode");
    }
    print_adapter_info(adapter);
    progress.dedent();

    progress.step("Parsing alignment file");
    progress.indent();
    let loaded = load_alignments(&job.paf, adapter)?;
    for warning in &loaded.warnings {
        progress.debug(&format!("Could not parse all PAF columns, {warning}"));
    }
    summary.alignment_lines = loaded.stats.lines;
    summary.kept_alignments = loaded.stats.kept;
    summary.low_quality = loaded.stats.low_quality;
    summary.malformed_lines = loaded.warnings.len();
    summary.reads = loaded.n_reads();
    progress.substep(&format!(
        "{} hits on {} reads",
        loaded.stats.kept,
        loaded.n_reads()
    ));
    if !loaded.warnings.is_empty() {
        progress.warning(&format!("Skipped {} malformed lines", loaded.warnings.len()));
    }
    progress.dedent();

    progress.step("Searching for adapter hits");
    progress.indent();
    let (layouts, cs_errors) = build_layouts(loaded.reads, adapter, config.max_distance);
    for (read_id, e) in &cs_errors {
        progress.debug(&format!("{read_id}: {e}"));
    }
    summary.cs_errors = cs_errors.len();
    progress.substep(&format!("Annotated {} layouts", layouts.len()));
    progress.dedent();

    progress.step("Finding inserts");
    progress.indent();
    let (result, layout_summary) =
        resolve_layouts(&layouts, adapter, config.report_partial, |resolution| {
            for (interval, decision) in &resolution.decisions {
                progress.debug(&format!("{:?}\t{}", decision, interval.to_bed_line()));
            }
        });
    drop(layouts);
    summary.layout = layout_summary;
    summary.intervals = result.n_intervals();
    progress.substep(&format!("demuxed reads {}", summary.layout.demuxed_reads));
    progress.substep(&format!(
        "Reads with missing adaptor {}",
        summary.layout.partial_reads
    ));
    progress.dedent();

    if let Some(bed) = &job.bed {
        progress.step("Writing insert intervals");
        write_bed(&result, bed)?;
        progress.success(&format!("Wrote {} intervals to {bed}", summary.intervals));
    }

    if let Some(output) = output {
        progress.step("Extracting inserts");
        progress.indent();
        let stats = write_demuxed_fastq(&result, &job.reads, output, |e| {
            progress.debug(&e.to_string())
        })?;
        progress.success(&format!("Wrote {} records", stats.written_records));
        progress.dedent();
        summary.extract = Some(stats);
    }

    print_summary_stats(&summary, progress.elapsed());
    progress.print_elapsed();
    Ok((result, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::io::open_fastq;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use seq_io::fastq::Record;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const I7: &str = "ACGTAC";
    const I5: &str = "TTGCAA";

    fn paf_line(read: &str, target: &str, start: usize, end: usize, mapq: u32, cs: &str) -> String {
        format!("{read}\t100\t{start}\t{end}\t+\t{target}\t40\t0\t20\t18\t20\t{mapq}\tNM:i:6\tcs:Z:{cs}\n")
    }

    fn fastq_record(id: &str, len: usize) -> String {
        let seq: String = "ACGTT".chars().cycle().take(len).collect();
        let qual: String = "#".repeat(len);
        format!("@{id} extra=1\n{seq}\n+\n{qual}\n")
    }

    struct Fixture {
        _dir: TempDir,
        job: DemuxJob,
    }

    fn fixture(paf: &str, fastq: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let path = |name: &str| dir.path().join(name).to_str().unwrap().to_string();

        std::fs::write(path("hits.paf"), paf).unwrap();
        let mut encoder =
            GzEncoder::new(File::create(path("reads.fastq.gz")).unwrap(), Compression::default());
        encoder.write_all(fastq.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let job = DemuxJob {
            paf: path("hits.paf"),
            reads: path("reads.fastq.gz"),
            output: Some(path("demuxed.fastq.gz")),
            bed: Some(path("inserts.bed")),
        };
        Fixture { _dir: dir, job }
    }

    fn read_output(path: &str) -> Vec<(String, usize)> {
        let mut reader = open_fastq(path).unwrap();
        let mut records = Vec::new();
        while let Some(record) = reader.next() {
            let record = record.unwrap();
            records.push((record.id().unwrap().to_string(), record.seq().len()));
        }
        records
    }

    #[test]
    fn test_dual_index_end_to_end() {
        let paf = [
            // i7 one substitution off, i5 exact
            paf_line("R1", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*na:7"),
            paf_line("R1", "ad_i5", 80, 100, 60, ":7*nt*nt*ng*nc*na*na:7"),
            // lone i7 hit
            paf_line("R2", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*nc:7"),
            // low quality partner
            paf_line("R3", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*nc:7"),
            paf_line("R3", "ad_i5", 80, 100, 5, ":7*nt*nt*ng*nc*na*na:7"),
        ]
        .concat();
        let fastq = [
            fastq_record("R0", 100),
            fastq_record("R1", 100),
            fastq_record("R2", 100),
            fastq_record("R3", 100),
        ]
        .concat();
        let fx = fixture(&paf, &fastq);
        let adapter = AdapterDefinition::new("ad", Some(I5), I7, 6, 6);

        let (result, summary) = run_demux(&fx.job, &adapter, &DemuxConfig::new()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(summary.reads, 3);
        assert_eq!(summary.low_quality, 1);
        assert_eq!(summary.layout.demuxed_reads, 1);
        assert_eq!(summary.layout.unresolved_reads, 2);
        assert_eq!(summary.layout.partial_reads, 0);

        let output = fx.job.output.as_deref().unwrap();
        assert_eq!(read_output(output), vec![("R1_insert_0".to_string(), 58)]);

        let bed = std::fs::read_to_string(fx.job.bed.as_deref().unwrap()).unwrap();
        assert_eq!(bed, "R1\t21\t79\tinsert_0\t999\t.\n");
    }

    #[test]
    fn test_single_index_end_to_end() {
        let paf = [
            paf_line("R1", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*nc:7"),
            paf_line("R1", "ad_i5", 70, 90, 60, ":7*ng*ng*ng*ng*ng*ng:7"),
            paf_line("R2", "ad_i5", 0, 20, 60, ":7*ng*ng*ng*ng*ng*ng:7"),
            paf_line("R2", "ad_i7", 50, 70, 60, ":7*na*nc*ng*nt*na*nc:7"),
        ]
        .concat();
        let fastq = [fastq_record("R1", 100), fastq_record("R2", 100)].concat();
        let fx = fixture(&paf, &fastq);
        let adapter = AdapterDefinition::new("ad", None, I7, 0, 6);

        let (_, summary) = run_demux(&fx.job, &adapter, &DemuxConfig::new()).unwrap();
        assert_eq!(summary.layout.demuxed_reads, 2);

        let output = fx.job.output.as_deref().unwrap();
        assert_eq!(
            read_output(output),
            vec![("R1_insert_0".to_string(), 48), ("R2_insert_0".to_string(), 28)]
        );
    }

    #[test]
    fn test_count_only_skips_extraction() {
        let paf = [
            paf_line("R1", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*nc:7"),
            paf_line("R1", "ad_i5", 80, 100, 60, ":7*nt*nt*ng*nc*na*na:7"),
        ]
        .concat();
        let fx = fixture(&paf, &fastq_record("R1", 100));
        let adapter = AdapterDefinition::new("ad", Some(I5), I7, 6, 6);
        let config = DemuxConfig::new().with_count_only(true);

        let (result, summary) = run_demux(&fx.job, &adapter, &config).unwrap();
        assert_eq!(result.len(), 1);
        assert!(summary.extract.is_none());
        assert!(!Path::new(fx.job.output.as_deref().unwrap()).exists());
    }

    #[test]
    fn test_malformed_paf_writes_nothing() {
        let paf = paf_line("R1", "other_i7", 0, 20, 60, ":20");
        let fx = fixture(&paf, &fastq_record("R1", 100));
        let adapter = AdapterDefinition::new("ad", Some(I5), I7, 6, 6);

        let err = run_demux(&fx.job, &adapter, &DemuxConfig::new()).unwrap_err();
        assert!(matches!(err, DemuxError::MalformedInput { .. }));
        assert!(!Path::new(fx.job.output.as_deref().unwrap()).exists());
        assert!(!Path::new(fx.job.bed.as_deref().unwrap()).exists());
    }

    #[test]
    fn test_missing_output_path() {
        let fx = fixture(&paf_line("R1", "ad_i7", 0, 20, 60, ":20"), "");
        let mut job = fx.job.clone();
        job.output = None;
        let adapter = AdapterDefinition::new("ad", None, I7, 0, 6);

        let err = run_demux(&job, &adapter, &DemuxConfig::new()).unwrap_err();
        assert!(matches!(err, DemuxError::InvalidParameter { .. }));
        assert!(run_demux(&job, &adapter, &DemuxConfig::new().with_count_only(true)).is_ok());
    }

    #[test]
    fn test_partial_report_opt_in() {
        let paf = [
            paf_line("R1", "ad_i7", 0, 20, 60, ":7*na*nc*ng*nt*na*nc:7"),
            paf_line("R1", "ad_i5", 80, 100, 60, ":7*ng*ng*ng*ng*ng*ng:7"),
        ]
        .concat();
        let fx = fixture(&paf, &fastq_record("R1", 100));
        let adapter = AdapterDefinition::new("ad", Some(I5), I7, 6, 6);

        let config = DemuxConfig::new().with_count_only(true);
        let (_, summary) = run_demux(&fx.job, &adapter, &config).unwrap();
        assert_eq!(summary.layout.partial_reads, 0);

        let config = config.with_partial_report(true);
        let (_, summary) = run_demux(&fx.job, &adapter, &config).unwrap();
        assert_eq!(summary.layout.partial_reads, 1);
        assert_eq!(summary.layout.demuxed_reads, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = DemuxConfig::new()
            .with_max_distance(3)
            .with_verbose(true)
            .with_partial_report(true);
        assert_eq!(config.max_distance, 3);
        assert!(config.verbose);
        assert!(config.report_partial);
        assert!(!config.count_only);
        assert_eq!(DemuxConfig::default().max_distance, 1);
    }
}
