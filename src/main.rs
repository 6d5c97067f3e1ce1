use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use skirmish_broadcast::{Broadcaster, ExecutionEvent, Subscriber, SubscriptionRegistry};
use skirmish_orchestrator::{Orchestrator, OrchestratorConfig};
use skirmish_scenario::{InMemoryScenarios, ScenarioSource};
use skirmish_store::{ExecutionStatus, ExecutionStore, MemoryStore};
use skirmish_transport::WsServer;

mod logging;

use logging::LogLevel;

/// Skirmish - threat scenario execution with live output streaming
#[derive(Parser)]
#[command(name = "skirmish")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log level (overrides SKIRMISH_LOG)
  #[arg(long, global = true)]
  log_level: Option<LogLevel>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Start the websocket service
  Serve {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,

    /// Path to the scenario catalog (JSON array)
    #[arg(long)]
    scenarios: PathBuf,

    /// Directory for per-execution config files (default: system temp)
    #[arg(long)]
    config_dir: Option<PathBuf>,
  },

  /// Run a single scenario in the foreground and stream its output
  Run {
    /// Path to the scenario catalog (JSON array)
    #[arg(long)]
    scenarios: PathBuf,

    /// The scenario id to execute
    #[arg(long)]
    scenario_id: i64,

    /// Path to a JSON config file for this run (default: empty object)
    #[arg(long)]
    config: Option<PathBuf>,

    /// User id to attribute the run to
    #[arg(long)]
    user: Option<i64>,
  },

  /// List the scenarios in a catalog
  List {
    /// Path to the scenario catalog (JSON array)
    #[arg(long)]
    scenarios: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init_logging(cli.log_level)?;

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Commands::Serve {
      listen,
      scenarios,
      config_dir,
    } => rt.block_on(serve(listen, scenarios, config_dir)),
    Commands::Run {
      scenarios,
      scenario_id,
      config,
      user,
    } => rt.block_on(run_scenario(scenarios, scenario_id, config, user)),
    Commands::List { scenarios } => rt.block_on(list_scenarios(scenarios)),
  }
}

struct Service {
  catalog: Arc<InMemoryScenarios>,
  store: Arc<MemoryStore>,
  registry: Arc<SubscriptionRegistry>,
  orchestrator: Arc<Orchestrator>,
}

async fn build_service(scenarios: &PathBuf, config_dir: Option<PathBuf>) -> Result<Service> {
  let catalog = Arc::new(
    InMemoryScenarios::from_file(scenarios)
      .await
      .with_context(|| format!("failed to load catalog: {}", scenarios.display()))?,
  );
  let store = Arc::new(MemoryStore::new());
  let registry = Arc::new(SubscriptionRegistry::new());
  let broadcaster = Broadcaster::new(registry.clone());

  let orchestrator_config = match config_dir {
    Some(config_dir) => OrchestratorConfig { config_dir },
    None => OrchestratorConfig::default(),
  };
  let orchestrator = Arc::new(Orchestrator::new(
    orchestrator_config,
    catalog.clone(),
    store.clone(),
    broadcaster,
  ));

  Ok(Service {
    catalog,
    store,
    registry,
    orchestrator,
  })
}

async fn serve(
  listen: SocketAddr,
  scenarios: PathBuf,
  config_dir: Option<PathBuf>,
) -> Result<()> {
  let service = build_service(&scenarios, config_dir).await?;
  info!(
    scenarios = service.catalog.list().await?.len(),
    "catalog loaded"
  );

  let server = WsServer::bind(listen, service.registry.clone(), service.orchestrator.clone())
    .await
    .context("failed to start websocket transport")?;

  let cancel = CancellationToken::new();
  let transport = tokio::spawn(server.run(cancel.clone()));

  tokio::signal::ctrl_c()
    .await
    .context("failed to listen for shutdown signal")?;
  info!("shutdown signal received");
  cancel.cancel();
  transport.await.context("transport task panicked")?;

  Ok(())
}

async fn run_scenario(
  scenarios: PathBuf,
  scenario_id: i64,
  config: Option<PathBuf>,
  user: Option<i64>,
) -> Result<()> {
  let service = build_service(&scenarios, None).await?;

  let config = match config {
    Some(path) => {
      let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
      serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?
    }
    None => serde_json::Value::Object(serde_json::Map::new()),
  };

  let (subscriber, mut events) = Subscriber::new();
  let execution = service
    .orchestrator
    .launch(scenario_id, user, config)
    .await
    .context("launch failed")?;
  service.registry.subscribe(&execution.id, subscriber).await;
  eprintln!("execution {} started", execution.id);

  // Stream events; poll the store as a backstop in case the script was so
  // fast that it finished before the subscription landed.
  let mut saw_events = false;
  let status = loop {
    tokio::select! {
      event = events.recv() => {
        match event {
          Some(ExecutionEvent::Output { text, .. }) => {
            saw_events = true;
            println!("{text}");
          }
          Some(ExecutionEvent::Status { status, .. }) => break status,
          None => break service.store.get(&execution.id).await?.status,
        }
      }
      _ = tokio::time::sleep(Duration::from_millis(500)) => {
        let current = service.store.get(&execution.id).await?;
        if current.status.is_terminal() {
          if !saw_events {
            print!("{}", current.output);
          }
          break current.status;
        }
      }
    }
  };

  eprintln!("execution {} finished: {:?}", execution.id, status);
  if status == ExecutionStatus::Failed {
    std::process::exit(1);
  }
  Ok(())
}

async fn list_scenarios(scenarios: PathBuf) -> Result<()> {
  let service = build_service(&scenarios, None).await?;
  for scenario in service.catalog.list().await? {
    println!(
      "{:>6}  {:<32} {}",
      scenario.id,
      scenario.name,
      scenario.script_path.display()
    );
  }
  Ok(())
}
