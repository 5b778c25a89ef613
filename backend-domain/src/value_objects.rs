// Domain value objects
pub mod identifiers;
pub mod scan_type;
pub mod tier;

pub use identifiers::*;
pub use scan_type::*;
pub use tier::*;
