// Domain entities

pub mod contest;
pub mod runtime_config;
pub mod scan_event;
pub mod snapshot;

pub use contest::*;
pub use runtime_config::*;
pub use scan_event::*;
pub use snapshot::*;
