//! Analysis module for result export and predator inspection.

pub mod export;
pub mod inspect;

pub use export::{CsvSink, ExportSystem, ResultSink};
pub use inspect::{inspect, IndividualReport, InspectionReport, PhenotypeView};
