// Domain services: profile maintenance and rule evaluation
pub mod evaluator;
pub mod profile_store;

pub use evaluator::*;
pub use profile_store::*;
