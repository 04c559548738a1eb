//! CLI command implementations

pub mod check;
pub mod explain;

pub use check::CheckArgs;
pub use explain::ExplainArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check TypeScript files for Trusted Types violations
    Check(CheckArgs),

    /// Show detailed explanation for a specific rule
    Explain(ExplainArgs),
}
