pub mod annotate;
pub mod demux;
pub mod error;
pub mod io;
pub mod layout;
pub mod paf;
pub mod progress;
pub mod trim;
pub mod types;

pub use error::{DemuxError, Result};
pub use types::{AdapterDefinition, AlignmentRecord, DemuxResult, InsertInterval};
