pub mod reader;

pub use reader::{load_alignments, LoadedAlignments, RecordParseWarning, MIN_MAPQ};
