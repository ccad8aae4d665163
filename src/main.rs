use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btce_watch::config::Settings;
use btce_watch::utils::api_key_man::{self, ApiCredentials};
use btce_watch::{AuthenticatedClient, BtceClient};

#[derive(Parser, Debug)]
#[command(name = "btce-watch")]
#[command(about = "Watch ticker, fee, balances and open orders on a BTC-e style venue", long_about = None)]
struct Args {
    /// Settings file (default: ./btce-watch.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Credentials file with `api_key:` and `api_sec:` lines
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Trading pair to watch, e.g. btc_usd or BTC/USD
    #[arg(short, long)]
    pair: Option<String>,
}

fn load_credentials(args: &Args, settings: &Settings) -> Result<Option<ApiCredentials>> {
    //explicit file first, then settings, then env
    if let Some(path) = args.credentials.as_ref().or(settings.credentials_file.as_ref()) {
        return api_key_man::read_api_credentials_from_file(path).map(Some);
    }
    Ok(api_key_man::read_api_credentials_from_env())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btce_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(pair) = &args.pair {
        settings.polling.pair = pair.clone();
    }
    let options = settings.client_options()?;

    let rest = BtceClient::new(settings.btce_config()).context("Failed to build HTTP client")?;
    let client = AuthenticatedClient::new(Arc::new(rest), options);

    let _ticker = client.on_price_changed(|tick, change| {
        info!(
            pair = %tick.pair,
            buy = %tick.buy,
            sell = %tick.sell,
            last = %tick.last,
            first = change.first_time,
            movement = ?change.movement,
            "ticker"
        );
    });
    let _fee = client.on_fee_changed(|fee, change| {
        info!(pair = %fee.pair, fee = %fee.trade, previous = ?change.previous, "fee");
    });
    let _account = client.on_account_changed(|account, change| {
        let funds: Vec<String> = change
            .changed_currencies
            .iter()
            .map(|currency| format!("{}={}", currency.display_name(), account.balance(*currency)))
            .collect();
        info!(
            first = change.first_time,
            rights_changed = change.rights_changed,
            open_orders = account.open_orders,
            funds = ?funds,
            "account"
        );
    });
    let _orders = client.on_orders_changed(|orders, change| {
        info!(
            count = orders.count(),
            amount = %orders.total_amount(),
            previous_count = ?change.previous_count,
            previous_amount = ?change.previous_amount,
            "active orders"
        );
    });

    //load api keys
    match load_credentials(&args, &settings) {
        Ok(Some(credentials)) => match client.set_credentials(&credentials.key, &credentials.secret).await {
            Ok(account) => info!(transactions = account.transaction_count, "authenticated"),
            Err(e) => error!(error = %e, "authentication failed, private streams stay paused"),
        },
        Ok(None) => warn!("no credentials configured, watching public streams only"),
        Err(e) => error!(error = %e, "failed to read credentials"),
    }

    let default_fee = client.current_fee();
    info!(pair = %client.pair(), fee = %default_fee.trade, "watching, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("shutting down");
    client.shutdown().await;
    Ok(())
}
