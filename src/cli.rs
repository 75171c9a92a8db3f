use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reportforge")]
#[command(author, version, about = "Activity report drafting and image resolution")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the local draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Submit a report form (JSON file)
    Submit {
        /// Form file
        #[arg(required = true)]
        form: PathBuf,

        /// Id of the report being edited
        #[arg(long)]
        id: Option<String>,
    },

    /// Print a stored report
    Show {
        id: String,

        /// Resolve image references before printing
        #[arg(long)]
        resolve: bool,

        /// Print in the shape a layout renders
        #[arg(long, value_enum, default_value = "letter")]
        layout: Layout,
    },

    /// List stored reports, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored report
    Delete { id: String },

    /// Resolve image references to displayable sources
    Resolve {
        #[arg(required = true)]
        refs: Vec<String>,

        /// Override the resolution deadline
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Compress an image file to JPEG
    Compress {
        input: PathBuf,

        /// Output file (prints a data URI when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        max_dimension: Option<u32>,

        /// JPEG quality between 0 and 1
        #[arg(long)]
        quality: Option<f32>,
    },

    /// Upload image files with the configured storage mode
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Folder inside the blob store
        #[arg(long, default_value = "laporan")]
        folder: String,
    },

    /// Print every resolved image across all reports
    Gallery,

    /// Remove every cached image payload
    ClearCache,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum DraftAction {
    /// Save a form (JSON file) as the current draft
    Save { form: PathBuf },

    /// Print the current draft
    Show,

    /// Forget the current draft
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Full report in letter form
    Letter,
    /// Flat image list of the magazine layout
    Magazine,
}
