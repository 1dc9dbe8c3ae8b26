//! testaudit-core: Validity analysis engine, analyzers, and data model.
//!
//! Three independent analyzers (person-fit, response-time, Guttman errors)
//! produce flags that the aggregator combines into a single verdict per
//! completed test session. The [`engine::ValidityEngine`] persists verdicts
//! through the storage traits and handles overrides and reports.

pub mod aggregator;
pub mod assessment;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod flags;
pub mod guttman;
pub mod model;
pub mod overrides;
pub mod person_fit;
pub mod report;
pub mod response_time;
pub mod traits;
