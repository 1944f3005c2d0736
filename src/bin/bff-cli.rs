use clap::{Parser, Subcommand};
use reqwest::Response;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bff-cli")]
#[command(about = "Command-line client for the storefront BFF", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000", env = "BFF_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show BFF health, credential flags and cache sizes
    Health,
    /// List items
    Items {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// List orders
    Orders {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one order
    Order { order_id: u64 },
    /// Exchange an authorization code for tokens
    Exchange {
        code: String,
        #[arg(long)]
        redirect_uri: Option<String>,
        /// Send client credentials only in the form body
        #[arg(long)]
        no_basic_auth: bool,
    },
    /// Refresh an access token
    Refresh {
        refresh_token: String,
        #[arg(long)]
        no_basic_auth: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Items { limit, offset } => {
            let mut query = Vec::new();
            push_opt(&mut query, "limit", limit);
            push_opt(&mut query, "offset", offset);
            client.get(format!("{}/items", base)).query(&query).send().await?
        }
        Commands::Orders { status, limit, offset } => {
            let mut query = Vec::new();
            push_opt(&mut query, "status", status);
            push_opt(&mut query, "limit", limit);
            push_opt(&mut query, "offset", offset);
            client.get(format!("{}/orders", base)).query(&query).send().await?
        }
        Commands::Order { order_id } => {
            client
                .get(format!("{}/orders/detail", base))
                .query(&[("order_id", order_id)])
                .send()
                .await?
        }
        Commands::Exchange { code, redirect_uri, no_basic_auth } => {
            let body = json!({
                "code": code,
                "redirect_uri": redirect_uri,
                "use_basic_auth": !no_basic_auth,
            });
            client.post(format!("{}/auth/exchange", base)).json(&body).send().await?
        }
        Commands::Refresh { refresh_token, no_basic_auth } => {
            let body = json!({
                "refresh_token": refresh_token,
                "use_basic_auth": !no_basic_auth,
            });
            client.post(format!("{}/auth/refresh", base)).json(&body).send().await?
        }
    };

    print_response(res).await
}

fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

async fn print_response(res: Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(retry_after) = res.headers().get(reqwest::header::RETRY_AFTER) {
        eprintln!("Retry-After: {}", retry_after.to_str().unwrap_or("?"));
    }
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: BFF returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
