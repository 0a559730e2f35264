use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use quantwatch::api::quantwise::QuantWiseClient;
use quantwatch::api::AnalysisApi;
use quantwatch::config::DEFAULT_API_URL;
use quantwatch::ui::console;
use quantwatch::{Holding, MonitorConfig, MonitoringSession};

#[derive(Parser)]
#[command(name = "quantwatch")]
#[command(about = "Live portfolio monitoring against the QuantWise analysis service", long_about = None)]
struct Cli {
    /// Holdings as SYMBOL=ALLOCATION, e.g. AAPL=50 MSFT=50
    #[arg(value_parser = parse_holding)]
    holdings: Vec<Holding>,

    /// Analysis service base URL
    #[arg(long, env = "QUANTWATCH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Print the analysis once and exit without live monitoring
    #[arg(long)]
    once: bool,
}

fn parse_holding(raw: &str) -> Result<Holding, String> {
    let (symbol, allocation) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=ALLOCATION, got '{}'", raw))?;
    let allocation = allocation
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid allocation '{}': {}", allocation, e))?;
    Ok(Holding::new(symbol.trim(), allocation))
}

fn default_holdings() -> Vec<Holding> {
    ["AAPL", "MSFT", "GOOG", "TSLA"]
        .into_iter()
        .map(|symbol| Holding::new(symbol, 25.0))
        .collect()
}

fn logger_builder() -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("quantwatch", LevelFilter::Debug)
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr); // Keep logs separate from the report
    builder
}

fn init_logger() {
    logger_builder().parse_default_env().init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_logger();
    let cli = Cli::parse();

    let holdings = if cli.holdings.is_empty() {
        default_holdings()
    } else {
        cli.holdings
    };

    let config = MonitorConfig::default().with_api_url(cli.api_url);
    let client = QuantWiseClient::new(&config)?;
    info!("Starting QuantWatch against {}", client.base_url());

    match client.health().await {
        Ok(health) => info!("Analysis service status: {}", health.status),
        Err(e) => warn!("Analysis service health check failed: {}", e),
    }

    let session = MonitoringSession::new(Arc::new(client), &config);
    session.bootstrap(&holdings).await?;
    println!("{}\n", console::render(&session));

    if cli.once {
        return Ok(());
    }

    session.activate().await?;

    let mut report = tokio::time::interval(config.poll_interval);
    report.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = report.tick() => println!("{}\n", console::render(&session)),
        }
    }

    session.deactivate();
    info!("Shutdown complete");
    Ok(())
}
