//! Solver results: `summary.json` parsing, index selectors and plots

pub mod extractor;
pub mod plots;
pub mod summary;
pub mod tensor;

pub use extractor::ResultExtractor;
pub use summary::{PathSummary, PlotKind, RadioMapSummary, Selector, Summary};
pub use tensor::{Complex, NdArray};
