// Domain services

pub mod aggregator;
pub mod report;
pub mod tier_policy;

pub use aggregator::*;
pub use report::*;
pub use tier_policy::*;
