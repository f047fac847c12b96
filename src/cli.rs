use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::volume::Label;

/// Command-line arguments for roi-volume
#[derive(Parser, Debug)]
#[command(name = "roi-volume")]
#[command(about = "Measure the volume of labelled regions of interest over a DICOM series")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Measure one mask against one reference image
    Compute {
        /// DICOM series directory, or volume file for `--kind volume_file`
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,

        /// Mask file (NIfTI)
        #[arg(value_name = "MASK")]
        mask: PathBuf,

        /// Reference source kind: dicom or volume_file
        #[arg(short, long, default_value = "dicom")]
        kind: String,

        /// Labels to measure, every non-zero label when omitted
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        labels: Option<Vec<Label>>,
    },

    /// Measure every series directory found under a root folder
    Batch {
        /// Root folder, each leaf directory below it is one series
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Mask file name, resolved in the parent of each series directory
        #[arg(short, long, value_name = "FILE")]
        roi: PathBuf,

        /// Reference source kind: dicom or volume_file
        #[arg(short, long, default_value = "dicom")]
        kind: String,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}
