use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pair {
    BtcUsd,
    BtcRur,
    BtcEur,
    LtcBtc,
    LtcUsd,
    LtcRur,
    LtcEur,
    UsdRur,
    EurUsd,
    Unknown,
}

impl Pair {
    pub const ALL: [Pair; 9] = [
        Pair::BtcUsd,
        Pair::BtcRur,
        Pair::BtcEur,
        Pair::LtcBtc,
        Pair::LtcUsd,
        Pair::LtcRur,
        Pair::LtcEur,
        Pair::UsdRur,
        Pair::EurUsd,
    ];

    /// Canonical lower-case form used in URLs and form parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pair::BtcUsd => "btc_usd",
            Pair::BtcRur => "btc_rur",
            Pair::BtcEur => "btc_eur",
            Pair::LtcBtc => "ltc_btc",
            Pair::LtcUsd => "ltc_usd",
            Pair::LtcRur => "ltc_rur",
            Pair::LtcEur => "ltc_eur",
            Pair::UsdRur => "usd_rur",
            Pair::EurUsd => "eur_usd",
            Pair::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> String {
        self.as_str().to_uppercase().replace('_', "/")
    }

    pub fn from_wire(s: &str) -> Pair {
        let s = s.trim().to_lowercase();
        Pair::ALL
            .into_iter()
            .find(|pair| pair.as_str() == s)
            .unwrap_or(Pair::Unknown)
    }

    pub fn from_display(s: &str) -> Pair {
        Pair::from_wire(&s.replace('/', "_"))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
