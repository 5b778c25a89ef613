pub mod aggregation_service;
pub mod report_service;

pub use aggregation_service::*;
pub use report_service::*;
