// Domain entities
pub mod evaluation;
pub mod profile;
pub mod rule_set;
pub mod run_summary;
pub mod runtime_config;
pub mod transaction;

pub use evaluation::*;
pub use profile::*;
pub use rule_set::*;
pub use run_summary::*;
pub use runtime_config::*;
pub use transaction::*;
