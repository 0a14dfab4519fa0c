//! Application services
//!
//! Concrete service implementations that orchestrate the engine.
//! Services depend on the FileSystem boundary trait but are themselves
//! concrete structs, not traits.

mod chart;
mod dataset;
mod selection;

pub use chart::{ChartOutcome, ChartReport, ChartService, ChartStatus};
pub use dataset::{DatasetFormat, DatasetLoader};
pub use selection::{RootSelection, RootSelectionStore};
