//! Domain models for the Crop Advisory Platform

mod features;
mod inputs;
mod nutrients;
mod prediction;
mod soil;
mod weather;

pub use features::*;
pub use inputs::*;
pub use nutrients::*;
pub use prediction::*;
pub use soil::*;
pub use weather::*;
