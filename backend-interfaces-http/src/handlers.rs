pub mod analytics_handlers;
pub mod contest_handlers;
pub mod ops_handlers;
pub mod report_handlers;
pub mod scan_handlers;

pub use analytics_handlers::*;
pub use contest_handlers::*;
pub use ops_handlers::*;
pub use report_handlers::*;
pub use scan_handlers::*;
