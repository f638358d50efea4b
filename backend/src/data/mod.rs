//! Local reference data

pub mod reference;

pub use reference::{ReferenceDataset, ReferenceRow};
