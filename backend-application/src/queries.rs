pub mod analytics_queries;
pub mod contest_queries;
pub mod report_queries;
pub mod scan_queries;
