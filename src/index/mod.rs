pub mod anchor;
pub mod key;
pub mod parser;
pub mod reader;
pub mod scan;
pub mod stats;
pub mod types;
pub mod writer;

pub use anchor::AnchorRef;
pub use reader::{read_fragment, ShapeError};
pub use scan::{discover_fragments, load_fragments, ScanOptions};
pub use stats::IndexStats;
pub use types::*;
