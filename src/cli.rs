// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find performance regressions in benchmark history", long_about = None)]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "regress.conf.json")]
    pub config: PathBuf,

    /// Path to the git repository, overriding the configuration
    #[arg(short, long)]
    pub repo: Option<PathBuf>,

    /// Directory holding the graphs and receiving regressions.json
    #[arg(long)]
    pub html_dir: Option<PathBuf>,

    /// Number of analysis workers, defaults to the available parallelism
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}
