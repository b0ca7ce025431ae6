pub mod pipeline;
pub mod splitter;

pub use pipeline::{IndexedDocument, IndexingPipeline};
