pub mod contest_log;
pub mod event_log;

pub use contest_log::*;
pub use event_log::*;
