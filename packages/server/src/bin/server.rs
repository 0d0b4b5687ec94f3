//! SitePulse live crowd-density server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sitepulse-server -- --jwt-secret dev-secret --seed seed.json
//! cargo run --bin sitepulse-server -- --host 0.0.0.0 --port 3000 --alert-trigger edge
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use sitepulse_server::{
    config::{
        DEFAULT_BROADCAST_INTERVAL_MS, DEFAULT_CLIENT_BUFFER, DEFAULT_HOST, DEFAULT_LOOKBACK_SECS,
        DEFAULT_PORT, DEFAULT_WS_PATHS, ServerConfig,
    },
    domain::AlertTrigger,
    infrastructure::{
        auth::JwtTokenVerifier,
        message_pusher::WebSocketSubscriptionRegistry,
        repository::{InMemoryCrowdRepository, SeedData},
    },
    ui::{Server, state::AppState},
    usecase::{
        BroadcastZoneUpdatesUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        GetZoneSnapshotUseCase, RecordSampleUseCase, UpdateSubscriptionUseCase,
    },
};
use sitepulse_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "sitepulse-server")]
#[command(about = "Live crowd-density broadcast server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "SITEPULSE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "SITEPULSE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Shared HS256 secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Paths the WebSocket gateway is mounted at (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_WS_PATHS.map(String::from))]
    ws_path: Vec<String>,

    /// Broadcast period in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_BROADCAST_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    broadcast_interval_ms: u64,

    /// Only samples newer than this many seconds are used
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_SECS)]
    lookback_secs: u64,

    /// Density (%) above which a critical alert is raised
    #[arg(long, default_value_t = 90.0)]
    overcrowding_threshold: f64,

    /// Density increase (percentage points) between ticks that counts as a surge
    #[arg(long, default_value_t = 30.0)]
    surge_delta: f64,

    /// `level`: alert every tick while overcrowded, `edge`: only when entering
    #[arg(long, default_value_t = AlertTrigger::Level)]
    alert_trigger: AlertTrigger,

    /// Outgoing messages buffered per connection before dropping
    #[arg(long, default_value_t = DEFAULT_CLIENT_BUFFER)]
    client_buffer: usize,

    /// JSON file with initial zones and samples
    #[arg(long)]
    seed: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            ws_paths: self.ws_path.clone(),
            broadcast_interval: Duration::from_millis(self.broadcast_interval_ms),
            lookback: Duration::from_secs(self.lookback_secs),
            overcrowding_threshold: self.overcrowding_threshold,
            surge_delta: self.surge_delta,
            alert_trigger: self.alert_trigger,
            client_buffer: self.client_buffer.max(1),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.to_config();

    // Initialize dependencies in order:
    // 1. Repository
    // 2. Registry / token verifier
    // 3. UseCases
    // 4. AppState
    // 5. Server

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 1. Create Repository (in-memory store, optionally seeded)
    let repository = match &args.seed {
        Some(path) => match SeedData::load(path) {
            Ok(seed) => {
                tracing::info!(
                    "Loaded {} zone(s) and {} sample(s) from {}",
                    seed.zones.len(),
                    seed.samples.len(),
                    path.display()
                );
                InMemoryCrowdRepository::from_seed(seed)
            }
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => InMemoryCrowdRepository::new(),
    };
    let repository = Arc::new(
        repository
            .with_clock(clock.clone())
            .retain_at_least(config.lookback_duration()),
    );

    // 2. Create registry and token verifier
    let registry = Arc::new(WebSocketSubscriptionRegistry::new());
    let token_verifier = Arc::new(JwtTokenVerifier::new(&args.jwt_secret));

    // 3. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
        token_verifier.clone(),
        registry.clone(),
    ));
    let update_subscription_usecase = Arc::new(UpdateSubscriptionUseCase::new(registry.clone()));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(registry.clone()));
    let get_zone_snapshot_usecase = Arc::new(GetZoneSnapshotUseCase::new(
        repository.clone(),
        clock.clone(),
        config.lookback_duration(),
    ));
    let broadcast_zone_updates_usecase = Arc::new(BroadcastZoneUpdatesUseCase::new(
        get_zone_snapshot_usecase.clone(),
        registry.clone(),
        clock.clone(),
        config.alert_policy(),
    ));
    let record_sample_usecase = Arc::new(RecordSampleUseCase::new(repository, clock));

    // 4. Create AppState
    let state = Arc::new(AppState {
        connect_client_usecase,
        update_subscription_usecase,
        disconnect_client_usecase,
        get_zone_snapshot_usecase,
        broadcast_zone_updates_usecase,
        record_sample_usecase,
        token_verifier,
        registry,
        client_buffer: config.client_buffer,
    });

    // 5. Create and run the server
    tracing::info!(
        "Alerts: overcrowding > {}%, surge > {} points, trigger {}",
        config.overcrowding_threshold,
        config.surge_delta,
        config.alert_trigger
    );
    let server = Server::new(state, config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
