//! CLI argument definitions for dcm2txt.

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "dcm2txt",
    version,
    about = "Write a text representation of a DICOM stream to standard output",
    long_about = "Write a text representation of DICOM FILE to standard output.\n\
                  With no FILE, read standard input.\n\n\
                  One line is printed per element: byte offset, nesting,\n\
                  tag, VR, value length, value and dictionary keyword."
)]
pub struct Cli {
    /// Set the output line length; must be at least 40.
    #[arg(
        short = 'w',
        long = "width",
        value_name = "COL",
        default_value_t = dicom_cli::dump::DEFAULT_WIDTH
    )]
    pub width: usize,

    /// DICOM input file; read standard input when omitted.
    #[arg(value_name = "FILE")]
    pub infile: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}
