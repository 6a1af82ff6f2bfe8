//! Domain models for the labscan pipeline.

mod analysis;
mod catalog;
mod range;

pub use analysis::*;
pub use catalog::*;
pub use range::*;
