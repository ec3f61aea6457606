// src/main.rs

mod cli;

use anyhow::{Context, Result};
use chrono::TimeZone;
use clap::Parser;
use cli::Args;
use git_regress::progress::{BarProgress, NoProgress};
use git_regress::{report, store, Analyzer, Config, GitHistory, PiecewiseStepDetector};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let start_time = Instant::now();
    let mut config = if args.config.exists() {
        Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?
    } else {
        Config::default()
    };
    if let Some(repo) = args.repo {
        config.repo = repo;
    }
    if let Some(html_dir) = args.html_dir {
        config.html_dir = html_dir;
    }

    let history = GitHistory::open(&config.repo)
        .with_context(|| format!("opening repository at {}", config.repo.display()))?;
    let hash_to_date = history.commit_dates(&config.branches, config.hash_length)?;
    if let Some((first, last)) = history.time_span()? {
        println!(
            "Repository history spans from {} to {} ({} commits).",
            rfc2822(first),
            rfc2822(last),
            hash_to_date.len()
        );
    }

    let graphs = store::discover_graphs(&config.html_dir)?;
    let benchmarks_file = config.results_dir.join("benchmarks.json");
    let benchmarks = store::load_benchmarks(&benchmarks_file)
        .with_context(|| format!("loading {}", benchmarks_file.display()))?;
    println!("Found {} graphs for {} benchmarks.", graphs.len(), benchmarks.len());

    let jobs = args
        .jobs
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);
    let analyzer = Analyzer {
        config: &config,
        history: &history,
        hash_to_date: &hash_to_date,
        detector: Arc::new(PiecewiseStepDetector::default()),
        jobs,
    };

    let analysis_start = Instant::now();
    let report = if args.quiet {
        analyzer.analyze(&graphs, &benchmarks, &mut NoProgress)?
    } else {
        let mut bar = BarProgress::new(graphs.len());
        let report = analyzer.analyze(&graphs, &benchmarks, &mut bar)?;
        bar.finish();
        report
    };
    println!(
        "Analysis finished in {:.2?}. Found {} regressions.",
        analysis_start.elapsed(),
        report.regressions.len()
    );

    let path = report::save(&config.html_dir, &report)?;
    println!("Wrote {}", path.display());
    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn rfc2822(seconds: i64) -> String {
    chrono::Utc
        .timestamp_opt(seconds, 0)
        .single()
        .map_or_else(|| seconds.to_string(), |t| t.to_rfc2822())
}
