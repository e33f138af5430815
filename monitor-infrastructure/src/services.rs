pub mod composite_sink;
pub mod console_sink;
pub mod dataset_generator;
pub mod jsonl_sink;

pub use composite_sink::*;
pub use console_sink::*;
pub use dataset_generator::*;
pub use jsonl_sink::*;
