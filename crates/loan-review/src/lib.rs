//! Loan origination review core: application and document lifecycles, the scoring-service
//! integration contract, and the officer-facing review session that composes them.

pub mod config;
pub mod error;
pub mod origination;
pub mod telemetry;
