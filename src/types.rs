use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Score and strand columns of an insert interval, BED style
pub const INSERT_SCORE: u32 = 999;
pub const INSERT_STRAND: char = '.';

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_paf(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

/// Adapter with its i5/i7 index regions. Without an i5 index, single adapter
/// inserts are accepted as well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterDefinition {
    pub name: String,
    pub i5_index: Option<String>,
    pub i7_index: String,
    pub i5_mask_len: usize,
    pub i7_mask_len: usize,
}

impl AdapterDefinition {
    pub fn new(
        name: &str,
        i5_index: Option<&str>,
        i7_index: &str,
        i5_mask_len: usize,
        i7_mask_len: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            i5_index: i5_index.map(str::to_string),
            i7_index: i7_index.to_string(),
            i5_mask_len,
            i7_mask_len,
        }
    }

    pub fn i5_name(&self) -> String {
        format!("{}_i5", self.name)
    }

    pub fn i7_name(&self) -> String {
        format!("{}_i7", self.name)
    }

    pub fn is_dual(&self) -> bool {
        self.i5_index.is_some()
    }
}

/// One adapter hit from the aligner
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub read_id: String,
    pub adapter: String,
    pub read_len: usize,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    pub cs: String,
    pub quality: u32,
    pub index_seq: Option<String>,
}

impl AlignmentRecord {
    /// Attach the barcode reconstructed for this hit
    pub fn with_index_seq(mut self, index_seq: String) -> Self {
        self.index_seq = Some(index_seq);
        self
    }

    pub fn has_index(&self) -> bool {
        self.index_seq.is_some()
    }
}

/// Half open span on a read between two adapter hits
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InsertInterval {
    pub read_id: String,
    pub start: i64,
    pub end: i64,
    pub label: String,
    pub score: u32,
    pub strand: char,
}

impl InsertInterval {
    pub fn new(read_id: &str, start: i64, end: i64, pair_idx: usize) -> Self {
        Self {
            read_id: read_id.to_string(),
            start,
            end,
            label: format!("insert_{pair_idx}"),
            score: INSERT_SCORE,
            strand: INSERT_STRAND,
        }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// Byte range of the interval if it fits a read of `read_len` bases
    pub fn slice_range(&self, read_len: usize) -> Option<std::ops::Range<usize>> {
        if self.start < 0 || self.is_empty() || self.end > read_len as i64 {
            return None;
        }
        Some(self.start as usize..self.end as usize)
    }

    pub fn to_bed_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.read_id, self.start, self.end, self.label, self.score, self.strand
        )
    }
}

/// Accepted intervals per read, remembering the order reads were first seen in
#[derive(Clone, Debug, Default)]
pub struct DemuxResult {
    intervals: HashMap<String, Vec<InsertInterval>>,
    order: Vec<String>,
}

impl DemuxResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, read_id: String, intervals: Vec<InsertInterval>) {
        if intervals.is_empty() {
            return;
        }
        if !self.intervals.contains_key(&read_id) {
            self.order.push(read_id.clone());
        }
        self.intervals.insert(read_id, intervals);
    }

    pub fn get(&self, read_id: &str) -> Option<&[InsertInterval]> {
        self.intervals.get(read_id).map(Vec::as_slice)
    }

    pub fn contains(&self, read_id: &str) -> bool {
        self.intervals.contains_key(read_id)
    }

    /// Number of reads with at least one accepted interval
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn n_intervals(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[InsertInterval])> {
        self.order
            .iter()
            .map(move |id| (id.as_str(), self.intervals[id].as_slice()))
    }
}
