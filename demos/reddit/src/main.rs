//! Subreddit browser CLI.
//!
//! Mounts the browser controller, waits for the initial load and prints the
//! rendered layout. `--select` and `--refresh` replay the picker and refresh
//! handlers, printing the layout after each.

use std::path::PathBuf;

use ambit_core::PropMap;
use ambit_reddit::{reddit_controller, source, AppState, AppStore, DemoConfig, Layout, Picker, SourceKind};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reddit-browser")]
#[command(about = "Browse subreddit headlines through an Ambit controller", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subreddit shown at startup
    #[arg(short, long)]
    initial: Option<String>,

    /// Read listings over HTTP instead of the built-in fixtures
    #[arg(long)]
    http: bool,

    /// Listing API root for the HTTP source
    #[arg(long)]
    base_url: Option<String>,

    /// Simulated fixture latency in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Pick this subreddit after the first render
    #[arg(short, long)]
    select: Option<String>,

    /// Refresh after the first render (and after --select)
    #[arg(short, long)]
    refresh: bool,

    /// Log filter directive, e.g. `ambit_core=debug`
    #[arg(long)]
    log: Option<String>,
}

impl Cli {
    fn config(&self) -> Result<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)?,
            None => DemoConfig::default(),
        };

        if let Some(initial) = &self.initial {
            config.initial = initial.clone();
        }
        if self.http {
            config.source.kind = SourceKind::Http;
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(latency_ms) = self.latency_ms {
            config.source.latency_ms = latency_ms;
        }
        if let Some(log) = &self.log {
            config.log_filter = Some(log.clone());
        }
        Ok(config)
    }
}

fn init_logging(config: &DemoConfig) {
    let filter = match &config.log_filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;
    init_logging(&config);

    let source = source::from_config(&config.source)?;
    let store = AppStore::new(AppState::new(config.initial.clone()));
    let controller = reddit_controller(&config, source);
    let mut instance = controller.mount(store, PropMap::new())?;

    if let Some(initialization) = instance.take_initialization() {
        initialization.await?;
    }
    println!("{}\n", instance.render()?);

    if let Some(reddit) = &cli.select {
        Picker::change(&instance.context(), reddit)?.await?;
        println!("{}\n", instance.render()?);
    }
    if cli.refresh {
        Layout::refresh(&instance.context())?.await?;
        println!("{}\n", instance.render()?);
    }

    if let Some(deinitialization) = instance.unmount() {
        deinitialization.await?;
    }
    Ok(())
}
