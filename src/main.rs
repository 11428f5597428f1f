use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use btrelay::client::ClientConnector;
use btrelay::config::{Config, Mode};
use btrelay::fetch::HttpFetcher;
use btrelay::observer::LogObserver;
use btrelay::server::Acceptor;
use btrelay::transport::TcpTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load().context("loading configuration")?;

    match cfg.mode {
        Mode::Server => run_server(cfg).await,
        Mode::Client => run_client(cfg).await,
    }
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(&cfg.fetch).context("building HTTP client")?;
    let handle = Acceptor::new(
        TcpTransport::new(&cfg.listen_addr),
        fetcher,
        Arc::new(LogObserver),
        Arc::new(LogObserver),
    )
    .with_service(cfg.service_id)
    .start()
    .await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    handle.stop();
    handle.join().await;

    Ok(())
}

async fn run_client(cfg: Config) -> anyhow::Result<()> {
    let mut client = ClientConnector::new(TcpTransport::new(&cfg.listen_addr), Arc::new(LogObserver))
        .with_service(cfg.service_id);
    client.connect(&cfg.peer_addr).await?;

    let mut urls = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(url) = urls.next_line().await? {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }

        if !client.is_connected() {
            client.connect(&cfg.peer_addr).await?;
        }

        match client.send_and_receive(url).await {
            Ok(body) => {
                stdout.write_all(body.as_bytes()).await?;
                stdout.flush().await?;
            }
            Err(e) => tracing::error!(url, error = %e, "Request failed"),
        }
    }

    client.disconnect();
    Ok(())
}
