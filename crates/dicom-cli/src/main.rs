//! dcm2txt entry point.

use std::fs::File;
use std::io::{self, Write as _};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use dicom_cli::dump::Dcm2Txt;
use dicom_cli::logging::{LogConfig, init_logging};

mod cli;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        ..LogConfig::default()
    };
    init_logging(&log_config);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("dcm2txt: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    {
        let mut dump = Dcm2Txt::with_width(&mut stdout, cli.width)?;
        match &cli.infile {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                dump.parse(file)?;
            }
            None => {
                dump.parse(io::stdin().lock())?;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}
