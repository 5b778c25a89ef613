pub mod contest_commands;
pub mod scan_commands;
