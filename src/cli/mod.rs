//! Command line surface.

pub mod inspect;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Subcommand};

pub use inspect::{cmd_elements, cmd_extract, cmd_login_check, cmd_resolve};
pub use output::OutputFormat;
pub use run::{cmd_run, RunArgs};

/// Where a single page comes from.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Local HTML file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Page fetched over HTTP
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract structured data from a page
    Extract {
        #[command(flatten)]
        source: SourceArgs,

        /// Content type or free-form description; inferred from the URL when omitted
        #[arg(long = "type", value_name = "TYPE")]
        data_type: Option<String>,
    },

    /// List interactive elements
    Elements {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Resolve a natural-language description to one element
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        /// What to look for, e.g. "Sign in button"
        description: String,
    },

    /// Check whether the page is behind a login wall
    LoginCheck {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Execute a plan of steps in an automation window
    Run(RunArgs),
}
