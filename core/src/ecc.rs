//! Error-correction levels and their byte budgets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::payload::constants::{CAP_BYTES_H, CAP_BYTES_L, CAP_BYTES_M, CAP_BYTES_Q};
use crate::Error;

/// QR error-correction level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EccLevel {
    L,
    M,
    #[default]
    Q,
    H,
}

impl EccLevel {
    /// Byte budget a payload must fit before a symbol is attempted at this level
    pub fn cap_bytes(self) -> usize {
        match self {
            EccLevel::L => CAP_BYTES_L,
            EccLevel::M => CAP_BYTES_M,
            EccLevel::Q => CAP_BYTES_Q,
            EccLevel::H => CAP_BYTES_H,
        }
    }

    /// Approximate share of the symbol that can be recovered
    pub fn recovery_percent(self) -> u8 {
        match self {
            EccLevel::L => 7,
            EccLevel::M => 15,
            EccLevel::Q => 25,
            EccLevel::H => 30,
        }
    }

    /// Next weaker level, if any
    pub fn weaker(self) -> Option<Self> {
        match self {
            EccLevel::H => Some(EccLevel::Q),
            EccLevel::Q => Some(EccLevel::M),
            EccLevel::M => Some(EccLevel::L),
            EccLevel::L => None,
        }
    }

    /// This level followed by every weaker one
    pub fn fallback_chain(self) -> impl Iterator<Item = EccLevel> {
        std::iter::successors(Some(self), |level| level.weaker())
    }

    pub fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            EccLevel::L => qrcode::EcLevel::L,
            EccLevel::M => qrcode::EcLevel::M,
            EccLevel::Q => qrcode::EcLevel::Q,
            EccLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl fmt::Display for EccLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            EccLevel::L => "L",
            EccLevel::M => "M",
            EccLevel::Q => "Q",
            EccLevel::H => "H",
        };
        write!(f, "{} ({}%)", letter, self.recovery_percent())
    }
}

impl FromStr for EccLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('L') => Ok(EccLevel::L),
            Some('M') => Ok(EccLevel::M),
            Some('Q') => Ok(EccLevel::Q),
            Some('H') => Ok(EccLevel::H),
            _ => Err(Error::InvalidInput(format!("unknown error-correction level: {}", s))),
        }
    }
}
