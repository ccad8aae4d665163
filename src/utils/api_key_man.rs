use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

pub const API_KEY_ENV: &str = "BTCE_API_KEY";
pub const API_SECRET_ENV: &str = "BTCE_API_SECRET";

#[derive(Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Reads `api_key:` / `api_sec:` lines from a credentials file.
pub fn read_api_credentials_from_file<P: AsRef<Path>>(file_path: P) -> Result<ApiCredentials> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open credentials file {}", file_path.display()))?;
    let reader = BufReader::new(file);
    let mut api_key = String::new();
    let mut api_sec = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if let Some(value) = line.strip_prefix("api_key:") {
            api_key = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("api_sec:") {
            api_sec = value.trim().to_string();
        }
    }

    if api_key.is_empty() || api_sec.is_empty() {
        bail!(
            "Credentials file {} must contain api_key: and api_sec: lines",
            file_path.display()
        );
    }

    Ok(ApiCredentials {
        key: api_key,
        secret: api_sec,
    })
}

pub fn read_api_credentials_from_env() -> Option<ApiCredentials> {
    let key = std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty())?;
    let secret = std::env::var(API_SECRET_ENV).ok().filter(|v| !v.is_empty())?;
    Some(ApiCredentials { key, secret })
}
