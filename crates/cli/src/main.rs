use clap::Parser;
use closer_cleanup::ShutdownRegistry;
use closer_config::{ConfigLoader, ShutdownConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "closer")]
#[command(
    about = "Run labelled cleanup actions in reverse order on SIGINT/SIGTERM",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Cleanup action label; repeat to register several, in order
    #[arg(short, long = "label", value_name = "LABEL")]
    labels: Vec<String>,

    /// Do not print labels or the signal notice
    #[arg(short, long)]
    quiet: bool,

    /// Exit status after a signal-triggered drain (1-255)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    exit_code: Option<i32>,

    /// Line printed when a termination signal arrives
    #[arg(long, value_name = "TEXT")]
    notice: Option<String>,

    /// JSON configuration file, applied before CLOSER_* variables
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Drain immediately and exit instead of waiting for a signal
    #[arg(long)]
    run_now: bool,

    /// Time each action takes to run, in milliseconds
    #[arg(long, value_name = "MILLIS", default_value_t = 0)]
    action_delay_ms: u64,
}

impl Cli {
    /// File and environment first, then command-line flags on top
    fn resolve_config(&self) -> closer_cleanup::Result<ShutdownConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        let mut config = loader.load()?;

        if self.quiet {
            config.logging = false;
        }
        if let Some(code) = self.exit_code {
            config.exit_code = code;
        }
        if let Some(notice) = &self.notice {
            config.notice.clone_from(notice);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    closer_utils::tracing::init()
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let registry = Arc::new(ShutdownRegistry::with_config(config));

    let delay = Duration::from_millis(cli.action_delay_ms);
    for label in &cli.labels {
        let name = label.clone();
        registry.register(label.clone(), move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            tracing::info!(label = %name, "cleanup action ran");
        });
    }

    if cli.run_now {
        let report = registry.drain().unwrap_or_default();
        report.into_result()?;
        return Ok(());
    }

    registry.arm_signal_shutdown()?;

    // The signal thread ends the process.
    loop {
        std::thread::park();
    }
}
