use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use fleet_replan::config::ReplanConfig;
use fleet_replan::error::ReplanError;
use fleet_replan::http_oracle::HttpTravelTimeOracle;
use fleet_replan::http_store::HttpJobStore;
use fleet_replan::orchestrator::Orchestrator;
use fleet_replan::solver_client::HttpSolverClient;
use log::{error, info, warn, Level};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(about = "Plan work assignments for a fleet of field technicians across a rolling horizon.")]
#[command(next_line_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file layered under defaults and `REPLAN_*` env vars.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Logging verbosity (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single replan cycle now.
    Run {
        /// Job store base URL.
        #[arg(long, env = "REPLAN_STORE_URL")]
        store_url: String,

        /// Travel-time oracle endpoint.
        #[arg(long, env = "REPLAN_ORACLE_URL")]
        oracle_url: String,

        /// Solver endpoint; overrides the configured value when set.
        #[arg(long, env = "REPLAN_SOLVER_URL")]
        solver_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Args::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" => Level::Warn,
        "error" => Level::Error,
        _ => Level::Info,
    };
    fleet_replan::logging::init(level);

    let mut config = match ReplanConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(why) => {
            error!("failed to load configuration: {why}");
            std::process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Commands::Run { store_url, oracle_url, solver_url } => {
            if let Some(solver_url) = solver_url {
                config.solver_endpoint = solver_url;
            }
            run_cycle(config, store_url, oracle_url).await
        }
    };

    std::process::exit(exit_code);
}

async fn run_cycle(config: ReplanConfig, store_url: String, oracle_url: String) -> i32 {
    let solver_timeout = Duration::from_secs(config.solver_timeout_secs);
    let oracle_timeout = Duration::from_secs(config.oracle_timeout_secs);
    let solver_endpoint = config.solver_endpoint.clone();

    let store: Arc<HttpJobStore> = Arc::new(HttpJobStore::new(store_url, Duration::from_secs(30)));
    let oracle: Arc<HttpTravelTimeOracle> = Arc::new(HttpTravelTimeOracle::new(oracle_url, oracle_timeout));
    let solver: Arc<HttpSolverClient> = Arc::new(HttpSolverClient::new(solver_endpoint, solver_timeout));

    let orchestrator = Orchestrator::new(config, store, oracle, solver);
    let cancel = CancellationToken::new();

    match orchestrator.run(Utc::now(), cancel).await {
        Ok(outcome) => {
            info!(
                "cycle finished: {} placed, {} pending review, {} solver call(s)",
                outcome.placed, outcome.pending_review, outcome.solver_calls
            );
            0
        }
        Err(ReplanError::NoTechnicians) => {
            info!("no active technicians; nothing to plan");
            0
        }
        Err(ReplanError::NoJobs) => {
            info!("no queued jobs; nothing to plan");
            0
        }
        Err(ReplanError::Cancelled) => {
            warn!("replan cycle was cancelled before its final write");
            130
        }
        Err(ReplanError::StoreQuery(why)) => {
            error!("store query failed: {why}");
            3
        }
        Err(ReplanError::Solver { message }) => {
            error!("solver returned an error: {message}");
            4
        }
        Err(ReplanError::SolverTransport(why)) => {
            error!("solver call failed: {why}");
            5
        }
        Err(ReplanError::Write(why)) => {
            error!("final write failed: {why}");
            6
        }
    }
}
