pub mod barcodes;
pub mod cs_parse;
