//! Patient directory entities.

pub mod model;

pub use model::{PatientRecord, PatientSnapshot};
