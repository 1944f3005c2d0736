//! Storefront BFF
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                storefront-bff                 │
//!                       │                                               │
//!   Client Request      │  ┌────────┐   ┌──────────────┐   ┌─────────┐  │
//!   ────────────────────┼─▶│  http  │──▶│ orchestrator │──▶│ backoff │  │
//!                       │  │ router │   │  (per route) │   │  guard  │  │
//!                       │  └────────┘   └──────┬───────┘   └─────────┘  │
//!                       │                      │                        │
//!                       │                      ▼                        │
//!                       │               ┌──────────────┐                │
//!                       │               │ response     │                │
//!                       │               │ cache (TTL)  │                │
//!                       │               └──────┬───────┘                │
//!                       │                      ▼                        │
//!   Client Response     │               ┌──────────────┐                │
//!   ◀───────────────────┼───────────────│  upstream    │◀───────────────┼──── BASE API
//!                       │               │  transport   │                │
//!                       │               └──────────────┘                │
//!                       └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use storefront_bff::config::ProcessEnv;
use storefront_bff::lifecycle::launch;

#[derive(Parser)]
#[command(name = "storefront-bff", version, about = "Backend-for-frontend proxy for the BASE API")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "BFF_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = launch(args.config.as_deref(), &ProcessEnv).await {
        eprintln!("storefront-bff: {}", e);
        std::process::exit(1);
    }
}
