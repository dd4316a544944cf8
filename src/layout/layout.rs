use crate::annotate::barcodes::annotate_record;
use crate::error::DemuxError;
use crate::types::{AdapterDefinition, AlignmentRecord, DemuxResult, InsertInterval};

/// What the resolver made of two neighbouring adapter hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairDecision {
    /// Both hits carry a matched index and differ in adapter (i5 + i7)
    Dual,
    /// Single index run, exactly one of the hits matched
    Single,
    Rejected,
}

impl PairDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, PairDecision::Rejected)
    }
}

pub fn classify_pair(
    m1: &AlignmentRecord,
    m2: &AlignmentRecord,
    adapter: &AdapterDefinition,
) -> PairDecision {
    if m1.has_index() && m2.has_index() && m1.adapter != m2.adapter {
        PairDecision::Dual
    } else if !adapter.is_dual() && (m1.has_index() ^ m2.has_index()) {
        PairDecision::Single
    } else {
        PairDecision::Rejected
    }
}

/// Span strictly between the two hits, one base away from each
pub fn candidate_interval(read_id: &str, m1: &AlignmentRecord, m2: &AlignmentRecord, pair_idx: usize) -> InsertInterval {
    InsertInterval::new(read_id, m1.end as i64 + 1, m2.start as i64 - 1, pair_idx)
}

/// Adapter hits of a single read, ordered by where they start on the read
#[derive(Debug, Clone)]
pub struct ReadLayout {
    pub read_id: String,
    pub records: Vec<AlignmentRecord>,
}

#[derive(Debug, Clone)]
pub struct ReadResolution {
    pub read_id: String,
    pub accepted: Vec<InsertInterval>,
    pub decisions: Vec<(InsertInterval, PairDecision)>,
}

impl ReadResolution {
    /// A rejected pair where at least one side matched its index
    pub fn has_partial(&self, layout: &ReadLayout) -> bool {
        layout
            .pairs()
            .zip(&self.decisions)
            .any(|((m1, m2), (_, d))| !d.is_accepted() && (m1.has_index() || m2.has_index()))
    }
}

impl ReadLayout {
    pub fn new(read_id: String, mut records: Vec<AlignmentRecord>) -> Self {
        records.sort_by_key(|r| r.start);
        Self { read_id, records }
    }

    /// Records 0&1, 2&3, ... a trailing odd record has no partner
    pub fn pairs(&self) -> impl Iterator<Item = (&AlignmentRecord, &AlignmentRecord)> {
        self.records.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn resolve(&self, adapter: &AdapterDefinition) -> ReadResolution {
        let mut accepted = Vec::new();
        let mut decisions = Vec::new();

        for (pair_no, (m1, m2)) in self.pairs().enumerate() {
            let candidate = candidate_interval(&self.read_id, m1, m2, pair_no * 2);
            let decision = classify_pair(m1, m2, adapter);
            if decision.is_accepted() {
                accepted.push(candidate.clone());
            }
            decisions.push((candidate, decision));
        }

        ReadResolution {
            read_id: self.read_id.clone(),
            accepted,
            decisions,
        }
    }
}

/// Barcode annotation of every hit, then one sorted layout per read
pub fn build_layouts(
    reads: Vec<(String, Vec<AlignmentRecord>)>,
    adapter: &AdapterDefinition,
    max_distance: usize,
) -> (Vec<ReadLayout>, Vec<(String, DemuxError)>) {
    let mut cs_errors = Vec::new();
    let layouts = reads
        .into_iter()
        .map(|(read_id, records)| {
            let records = records
                .into_iter()
                .map(|record| {
                    let annotated = annotate_record(record, adapter, max_distance);
                    if let Some(e) = annotated.cs_error {
                        cs_errors.push((read_id.clone(), e));
                    }
                    annotated.record
                })
                .collect();
            ReadLayout::new(read_id, records)
        })
        .collect();
    (layouts, cs_errors)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayoutSummary {
    pub demuxed_reads: usize,
    pub unresolved_reads: usize,
    /// Only counted when partial reporting is requested, zero otherwise
    pub partial_reads: usize,
}

/// Pair up the hits of every read and keep the accepted insert intervals
pub fn resolve_layouts(
    layouts: &[ReadLayout],
    adapter: &AdapterDefinition,
    report_partial: bool,
    mut on_read: impl FnMut(&ReadResolution),
) -> (DemuxResult, LayoutSummary) {
    let mut result = DemuxResult::new();
    let mut summary = LayoutSummary::default();

    for layout in layouts {
        let resolution = layout.resolve(adapter);
        on_read(&resolution);

        if report_partial && resolution.has_partial(layout) {
            summary.partial_reads += 1;
        }

        if resolution.accepted.is_empty() {
            summary.unresolved_reads += 1;
        } else {
            summary.demuxed_reads += 1;
            result.insert(resolution.read_id, resolution.accepted);
        }
    }

    (result, summary)
}
