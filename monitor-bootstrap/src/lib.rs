pub mod context;
pub mod lifecycle;

pub use context::AppContext;
pub use lifecycle::{run_generate_command, run_monitor_command, GenerateOverrides, MonitorOverrides};
