//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the workspace
//! command service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_outcome_json, format_outcome_text, ReportStyle};
pub use route::{OutputFormat, RunContext};
