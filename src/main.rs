use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inline_sweep::config::{self, SweepConfig};
use inline_sweep::display;
use inline_sweep::harness::ProcessHarness;
use inline_sweep::report::{self, Report};
use inline_sweep::sweep;
use inline_sweep::types::OutputFormat;

#[derive(Parser)]
#[command(
    name = "inline-sweep",
    version,
    about = "Sweep MIR inlining thresholds over the UI test suite and compare results"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the harness once per threshold and merge results into the report
    Run(RunArgs),
    /// Print a previously recorded report
    Show(ShowArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// TOML sweep config (defaults to ./inline-sweep.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated thresholds, e.g. "0,10,20"
    #[arg(long)]
    thresholds: Option<String>,

    /// Extra test to exclude; may be repeated
    #[arg(long = "skip", value_name = "NAME")]
    skip: Vec<String>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for raw harness logs (cleared before the sweep)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Report file to merge results into
    #[arg(long)]
    report: Option<PathBuf>,

    /// Harness entry, whitespace-separated, e.g. "cargo uitest"
    #[arg(long)]
    harness: Option<String>,

    /// Skip the warm-up build
    #[arg(long)]
    no_warmup: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// TOML sweep config used to locate the report
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report file to read
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    format: OutputFormat,

    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn into_config(self) -> Result<SweepConfig> {
        let mut config = SweepConfig::load(self.config.as_deref())?;

        if let Some(list) = self.thresholds {
            config.thresholds = config::parse_threshold_list(&list)
                .map_err(|e| anyhow::anyhow!("--thresholds: {}", e))?;
        }
        config.skip.extend(self.skip);
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(out_dir) = self.out_dir {
            config.out_dir = out_dir;
        }
        if let Some(report) = self.report {
            config.report = report;
        }
        if let Some(harness) = self.harness {
            config.harness = harness.split_whitespace().map(str::to_string).collect();
        }
        if self.no_warmup {
            config.warmup = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let config = args.into_config()?;
            let mut harness = ProcessHarness::from_config(&config);
            let merged = sweep::run(&config, &mut harness)
                .with_context(|| format!("sweep aborted (report: {})", config.report.display()))?;

            let updated = report::last_modified(&config.report);
            print!("{}", display::format_default(&merged, updated, Utc::now()));
        }
        Commands::Show(args) => {
            let path = match args.report {
                Some(path) => path,
                None => SweepConfig::load(args.config.as_deref())?.report,
            };
            let loaded = Report::open(&path)?;

            let output = if args.json {
                display::format_json(&loaded)
            } else {
                match args.format {
                    OutputFormat::Short => display::format_short(&loaded),
                    OutputFormat::Default => {
                        let updated = report::last_modified(&path);
                        display::format_default(&loaded, updated, Utc::now())
                    }
                }
            };

            print!("{}", output);
            if args.json {
                println!();
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}
