pub mod demux;

pub use demux::{run_demux, write_bed, DemuxConfig, DemuxJob, DemuxSummary};
