//! Tiered point-lookup strategies
//!
//! One strategy per configured data source, chosen by the source's query
//! capability. Every strategy settles with exactly one [`LookupOutcome`];
//! provider failures become `Failed` outcomes rather than escaping.

mod outcome;
mod strategy;

pub use outcome::LookupOutcome;
pub use strategy::{ContainmentFirst, LookupStrategy, MultiProvider, PixelIdentify};
