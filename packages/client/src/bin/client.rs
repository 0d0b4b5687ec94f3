//! Terminal client for the SitePulse live crowd-density feed.
//!
//! Connects to the gateway, follows one site at a time and prints zone
//! updates and alerts as they arrive. Reconnects on connection loss with
//! exponential backoff and re-subscribes to the last followed site.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sitepulse-client -- --token <jwt> --site 7
//! cargo run --bin sitepulse-client -- --secret dev-secret --user-id 42
//! ```

use clap::Parser;

use sitepulse_client::client::{ClientOptions, resolve_token, run_client};
use sitepulse_server::domain::SiteId;
use sitepulse_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "sitepulse-client")]
#[command(about = "Terminal client for live crowd-density updates", long_about = None)]
struct Args {
    /// WebSocket gateway URL
    #[arg(
        short = 'u',
        long,
        env = "SITEPULSE_URL",
        default_value = "ws://127.0.0.1:8080/api/live/stream"
    )]
    url: String,

    /// Access token (HS256 JWT)
    #[arg(short = 't', long, env = "SITEPULSE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Shared secret to mint a development token (with --user-id)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// User id placed in a minted development token
    #[arg(long)]
    user_id: Option<String>,

    /// Site to follow right after connecting
    #[arg(short = 's', long)]
    site: Option<SiteId>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let token = match resolve_token(args.token, args.secret.as_deref(), args.user_id.as_deref()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let options = ClientOptions {
        url: args.url,
        token,
        site: args.site,
    };

    // Run the client
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
