use crate::annotate::cs_parse::tokenize_cs;
use crate::error::Result;
use crate::types::{AdapterDefinition, AlignmentRecord};

/// Bases the read shows at the masked (`n`) positions of the adapter template,
/// in the order the cs string lists them. Only substitutions are considered,
/// indels inside the masked region are not.
pub fn reconstruct_barcode(cs: &str) -> Result<String> {
    let ops = tokenize_cs(cs)?;
    let bases: Vec<u8> = ops.iter().filter_map(|op| op.masked_query_base()).collect();
    // masked_query_base only yields ascii acgt
    Ok(String::from_utf8_lossy(&bases).into_owned())
}

/// Reconstructed barcode if it is within `max_distance` edits of `expected`.
/// A hit without any masked substitution never matches.
pub fn match_barcode(cs: &str, expected: &str, max_distance: usize) -> Result<Option<String>> {
    let observed = reconstruct_barcode(cs)?;
    if observed.is_empty() {
        return Ok(None);
    }
    let dist = strsim::levenshtein(&expected.to_ascii_lowercase(), &observed);
    Ok((dist <= max_distance).then_some(observed))
}

/// Which index a hit has to be compared against, if any
fn expected_index<'a>(adapter: &'a AdapterDefinition, target: &str) -> Option<&'a str> {
    if target == adapter.i5_name() {
        adapter.i5_index.as_deref()
    } else if target == adapter.i7_name() {
        Some(adapter.i7_index.as_str())
    } else {
        None
    }
}

/// Outcome of annotating one hit with its barcode
#[derive(Debug)]
pub struct AnnotatedRecord {
    pub record: AlignmentRecord,
    /// cs string that could not be decoded, the hit is kept unmatched
    pub cs_error: Option<crate::error::DemuxError>,
}

pub fn annotate_record(
    record: AlignmentRecord,
    adapter: &AdapterDefinition,
    max_distance: usize,
) -> AnnotatedRecord {
    let Some(expected) = expected_index(adapter, &record.adapter) else {
        return AnnotatedRecord { record, cs_error: None };
    };

    match match_barcode(&record.cs, expected, max_distance) {
        Ok(Some(index_seq)) => AnnotatedRecord {
            record: record.with_index_seq(index_seq),
            cs_error: None,
        },
        Ok(None) => AnnotatedRecord { record, cs_error: None },
        Err(e) => AnnotatedRecord { record, cs_error: Some(e) },
    }
}
