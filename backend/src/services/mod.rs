//! Business logic services for the Crop Advisory Platform

pub mod advisory;
pub mod features;
pub mod soil;
pub mod weather;

pub use advisory::{Advisory, AdvisoryService, AdvisorySettings, Providers};
pub use features::{AssemblyContext, AssemblyError};
pub use soil::SoilResolver;
pub use weather::WeatherService;
