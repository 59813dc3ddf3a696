use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use waconn::{
    bot::Responder,
    webex::{self, BotState, WebexClient, WebexSettings},
    WaConn,
};

/// Webex webhook that answers `!loaded` and `!willrun` in chat.
#[derive(Parser, Debug)]
#[command(name = "wa-webex-bot", version, about)]
struct Cli {
    /// Connection and bot properties file
    #[arg(long, env = "WACONN_CONFIG", default_value = "waconn.ini")]
    config: PathBuf,

    /// API path prefix on every host
    #[arg(long, env = "WACONN_PREFIX", default_value = "/twsd")]
    prefix: String,

    /// Address the webhook listens on
    #[arg(long, env = "WEBEX_BOT_LISTEN", default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Webex API root
    #[arg(long, env = "WEBEX_API_URL", default_value = webex::DEFAULT_API_URL)]
    webex_api_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = WebexSettings::load(&cli.config)
        .with_context(|| format!("loading bot settings from {}", cli.config.display()))?;
    let conn = WaConn::from_config_file(&cli.config, cli.prefix)
        .with_context(|| format!("loading connection properties from {}", cli.config.display()))?;

    let state = BotState {
        responder: Responder::new(conn).with_timezone_offset(settings.timezone_offset),
        webex: WebexClient::with_base_url(cli.webex_api_url, settings.access_token),
        allowed_room_id: settings.allowed_room_id,
    };

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;
    tracing::info!(addr = %cli.listen, "webex bot listening");

    axum::serve(listener, webex::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")
}
