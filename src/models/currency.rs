use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Usd,
    Ltc,
    Btc,
    Nmc,
    Rur,
    Eur,
    Nvc,
    Trc,
    Ppc,
    Ftc,
    Xpm,
    Cnh,
    Gbp,
    Dsh,
    Eth,
    Unknown,
}

impl Currency {
    pub const ALL: [Currency; 15] = [
        Currency::Usd,
        Currency::Ltc,
        Currency::Btc,
        Currency::Nmc,
        Currency::Rur,
        Currency::Eur,
        Currency::Nvc,
        Currency::Trc,
        Currency::Ppc,
        Currency::Ftc,
        Currency::Xpm,
        Currency::Cnh,
        Currency::Gbp,
        Currency::Dsh,
        Currency::Eth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Ltc => "ltc",
            Currency::Btc => "btc",
            Currency::Nmc => "nmc",
            Currency::Rur => "rur",
            Currency::Eur => "eur",
            Currency::Nvc => "nvc",
            Currency::Trc => "trc",
            Currency::Ppc => "ppc",
            Currency::Ftc => "ftc",
            Currency::Xpm => "xpm",
            Currency::Cnh => "cnh",
            Currency::Gbp => "gbp",
            Currency::Dsh => "dsh",
            Currency::Eth => "eth",
            Currency::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Case-insensitive; unrecognized codes map to [`Currency::Unknown`].
    pub fn from_wire(s: &str) -> Currency {
        let s = s.trim().to_lowercase();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.as_str() == s)
            .unwrap_or(Currency::Unknown)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
