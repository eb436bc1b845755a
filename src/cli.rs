//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, ConfigCommands, OutputFormat};
pub use presentation::{
    format_config_validation, format_plan_json, format_plan_text, format_summary_json,
    format_summary_text,
};
pub use route::{command_name, RunContext};
