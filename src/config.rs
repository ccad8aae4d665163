use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;

use crate::client::ClientOptions;
use crate::exchanges::BtceConfig;
use crate::models::Pair;
use crate::poll::PriceTrigger;

pub const DEFAULT_CONFIG_FILE: &str = "btce-watch";
pub const ENV_PREFIX: &str = "BTCE";

#[derive(Debug, Deserialize, Clone)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Polling {
    pub pair: String,
    pub ticker_secs: u64,
    pub fee_secs: u64,
    pub account_secs: u64,
    pub orders_secs: u64,
    /// Trigger names (`buy`, `sell_up`, ...); empty means always.
    pub price_trigger: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: Api,
    pub polling: Polling,
    pub credentials_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `path` (or `btce-watch.toml` if present), then `BTCE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Self::builder(path)?.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("polling.price_trigger")
                .try_parsing(true),
        );
        Self::finish(builder)
    }

    fn builder(path: Option<&Path>) -> Result<ConfigBuilder<DefaultState>> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = Config::builder()
            .set_default("api.base_url", "https://btc-e.com")?
            .set_default("api.timeout_secs", 10)?
            .set_default("polling.pair", "btc_usd")?
            .set_default("polling.ticker_secs", 1)?
            .set_default("polling.fee_secs", 10800)?
            .set_default("polling.account_secs", 5)?
            .set_default("polling.orders_secs", 5)?
            .set_default("polling.price_trigger", Vec::<String>::new())?
            .add_source(file);
        Ok(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }

    /// Accepts either `btc_usd` or `BTC/USD`.
    pub fn pair(&self) -> Result<Pair> {
        let raw = &self.polling.pair;
        let pair = match Pair::from_wire(raw) {
            Pair::Unknown => Pair::from_display(raw),
            pair => pair,
        };
        if pair == Pair::Unknown {
            return Err(anyhow!("Unknown trading pair {:?}", raw));
        }
        Ok(pair)
    }

    pub fn price_trigger(&self) -> Result<PriceTrigger> {
        let mut trigger = PriceTrigger::ALWAYS;
        for name in &self.polling.price_trigger {
            trigger |= PriceTrigger::from_name(name).ok_or_else(|| anyhow!("Unknown price trigger {:?}", name))?;
        }
        Ok(trigger)
    }

    pub fn btce_config(&self) -> BtceConfig {
        BtceConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn client_options(&self) -> Result<ClientOptions> {
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be greater than zero"));
        }
        Ok(ClientOptions {
            pair: self.pair()?,
            ticker_period: Duration::from_secs(self.polling.ticker_secs),
            fee_period: Duration::from_secs(self.polling.fee_secs),
            account_period: Duration::from_secs(self.polling.account_secs),
            orders_period: Duration::from_secs(self.polling.orders_secs),
            price_trigger: self.price_trigger()?,
            fetch_timeout: Duration::from_secs(self.api.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_file(name: &str, contents: &str) -> Result<Settings> {
        let path = std::env::temp_dir().join(format!("btce-watch-{}-{}.toml", std::process::id(), name));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        let settings = Settings::finish(Settings::builder(Some(&path))?);
        std::fs::remove_file(&path).ok();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::finish(Settings::builder(None).unwrap()).unwrap();
        assert_eq!(settings.api.base_url, "https://btc-e.com");
        assert!(settings.credentials_file.is_none());

        let options = settings.client_options().unwrap();
        assert_eq!(options.pair, Pair::BtcUsd);
        assert_eq!(options.ticker_period, Duration::from_secs(1));
        assert_eq!(options.fee_period, Duration::from_secs(10800));
        assert_eq!(options.account_period, Duration::from_secs(5));
        assert_eq!(options.orders_period, Duration::from_secs(5));
        assert_eq!(options.fetch_timeout, Duration::from_secs(10));
        assert!(options.price_trigger.is_always());
    }

    #[test]
    fn test_file_overrides() {
        let settings = load_file(
            "overrides",
            r#"
credentials_file = "/etc/btce/keys"

[api]
base_url = "http://localhost:8080"

[polling]
pair = "LTC/EUR"
ticker_secs = 3
price_trigger = ["buy_up", "sell_down"]
"#,
        )
        .unwrap();

        assert_eq!(settings.btce_config().base_url, "http://localhost:8080");
        assert_eq!(settings.btce_config().timeout, Duration::from_secs(10));
        assert_eq!(settings.credentials_file, Some(PathBuf::from("/etc/btce/keys")));

        let options = settings.client_options().unwrap();
        assert_eq!(options.pair, Pair::LtcEur);
        assert_eq!(options.ticker_period, Duration::from_secs(3));
        assert_eq!(options.price_trigger, PriceTrigger::BUY_UP | PriceTrigger::SELL_DOWN);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let settings = load_file("bad-pair", "[polling]\npair = \"doge_usd\"\n").unwrap();
        assert!(settings.client_options().is_err());

        let settings = load_file("bad-trigger", "[polling]\nprice_trigger = [\"sideways\"]\n").unwrap();
        assert!(settings.price_trigger().is_err());

        let settings = load_file("zero-timeout", "[api]\ntimeout_secs = 0\n").unwrap();
        let err = settings.client_options().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let missing = PathBuf::from("/nonexistent/btce-watch.toml");
        assert!(Settings::finish(Settings::builder(Some(&missing)).unwrap()).is_err());
    }
}
