// Source and Sink Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod sinks;
pub mod sources;

pub use sinks::*;
pub use sources::*;
