pub mod export_commands;
pub mod monitor_commands;
