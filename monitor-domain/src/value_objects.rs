// Domain value objects
pub mod category;
pub mod risk_level;

pub use category::*;
pub use risk_level::*;
