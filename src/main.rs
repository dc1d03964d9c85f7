use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use presence_beacon::{
    HeartbeatConfig, HeartbeatScheduler, HostEvents, IdentityProvider, JsonFileStore,
    SchedulerSlot,
};

#[derive(Parser)]
#[command(name = "presence-beacon")]
#[command(about = "Installation heartbeat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Heartbeat endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Modpack name reported in the payload
    #[arg(long, global = true)]
    modpack: Option<String>,

    /// Tick period in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Identity store file (defaults to the user config dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Stable device string (defaults to a machine-id fingerprint)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send heartbeats until Ctrl-C
    Run,
    /// Send a single heartbeat and print the outcome
    Ping,
    /// Print the installation identity, creating it if needed
    Identity,
    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> HeartbeatConfig {
        let mut config = HeartbeatConfig::default();
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(modpack) = &self.modpack {
            config.modpack = modpack.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
        config
    }

    fn open_store(&self) -> anyhow::Result<Arc<JsonFileStore>> {
        let path = self
            .store
            .clone()
            .unwrap_or_else(JsonFileStore::default_path);
        Ok(Arc::new(JsonFileStore::open(path)?))
    }

    fn device(&self) -> String {
        self.device.clone().unwrap_or_default()
    }
}

fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = cli.config();

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Version => {
            println!("presence-beacon {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Identity => {
            let provider =
                IdentityProvider::new(cli.open_store()?, &config.identity_key, &cli.device());
            println!("{}", provider.get_or_create());
        }
        Commands::Ping => {
            let scheduler = HeartbeatScheduler::from_config(
                &config,
                cli.open_store()?,
                &cli.device(),
                Arc::new(HostEvents::new()),
            )?;
            let outcome = scheduler.trigger_now().await;
            println!(
                "{} -> {:?}",
                scheduler.identity().unwrap_or_default(),
                outcome
            );
        }
        Commands::Run => {
            let store = cli.open_store()?;
            let device = cli.device();
            let events = Arc::new(HostEvents::new());

            let scheduler = SchedulerSlot::global()
                .ensure_exists(|| {
                    HeartbeatScheduler::from_config(&config, store, &device, events.clone())
                })?
                .into_scheduler();
            info!(
                "Reporting presence as {} every {}ms",
                scheduler.identity().unwrap_or_default(),
                scheduler.interval().as_millis()
            );

            tokio::signal::ctrl_c().await?;
            events.emit_quitting();
            scheduler.destroy();
        }
    }

    Ok(())
}
