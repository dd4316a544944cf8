pub mod layout;

pub use layout::{build_layouts, resolve_layouts, LayoutSummary, PairDecision, ReadLayout};
