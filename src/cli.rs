//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hot-reloading page template registry
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: hotpage.toml)
    #[arg(short = 'C', long, default_value = "hotpage.toml")]
    pub config: PathBuf,

    /// Templates directory path (relative to project root)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile every template and report the result
    Check,

    /// Render one template with a JSON context
    Render {
        /// Logical template name, e.g. `package` or `toast`
        name: String,

        /// JSON file used as the render context
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile, then recompile on every template change until Ctrl-C
    Watch,
}

#[allow(unused)]
impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch)
    }
}
