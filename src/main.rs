use anyhow::Result;
use buddy_relay::config::Config;
use buddy_relay::relay::Relay;
use buddy_relay::server::{self, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "buddy-relay")]
#[command(about = "Relay prompts to an upstream image generation API")]
struct CliArgs {
    /// Address to bind (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long, short)]
    port: Option<u16>,

    /// Image upstream base URL (overrides UPSTREAM_BASE_URL).
    #[arg(long, value_name = "URL", value_parser = parse_base_url)]
    upstream_base_url: Option<String>,
}

fn parse_base_url(input: &str) -> std::result::Result<String, String> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(input.to_string())
    } else {
        Err(format!(
            "Invalid URL '{}'. Expected it to start with http:// or https://",
            input
        ))
    }
}

impl CliArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.upstream_base_url {
            config.upstream_base_url = url;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buddy_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    info!("Starting buddy-relay");

    let relay = Relay::from_config(&config);
    let app = server::create_app(AppState::new(relay, &config.health_message));

    let listener = TcpListener::bind(config.bind_address()).await?;
    server::serve(listener, app).await?;

    Ok(())
}
