//! Tariff-period (PTEC) derivation.
//!
//! The `PTEC` field carries the currently active pricing period as a short
//! code (`HCJB`, `HP..`, `TH..`, ...). Derivation maps every possible code,
//! including empty and unrecognized ones, to exactly one friendly-name /
//! short-code / presentation-hint triple:
//!
//! 1. exact matches for the six Tempo color/period combinations,
//! 2. prefix matches for the generic period families,
//! 3. an "unknown" default.
//!
//! The mapping is pure and total.

use serde::Serialize;

/// Derived tariff-period triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TariffPeriod {
    /// Human-readable period name, e.g. "Heures Creuses (Tempo Bleu)".
    pub friendly: &'static str,

    /// Short code, e.g. "HC_BLEU".
    pub short: &'static str,

    /// Presentation hint for downstream dashboards.
    pub icon: &'static str,
}

/// Exact matches for the six Tempo tariff/color combinations.
const TEMPO: &[(&str, TariffPeriod)] = &[
    (
        "HCJB",
        TariffPeriod {
            friendly: "Heures Creuses (Tempo Bleu)",
            short: "HC_BLEU",
            icon: "mdi:weather-night",
        },
    ),
    (
        "HPJB",
        TariffPeriod {
            friendly: "Heures Pleines (Tempo Bleu)",
            short: "HP_BLEU",
            icon: "mdi:white-balance-sunny",
        },
    ),
    (
        "HCJW",
        TariffPeriod {
            friendly: "Heures Creuses (Tempo Blanc)",
            short: "HC_BLANC",
            icon: "mdi:weather-night",
        },
    ),
    (
        "HPJW",
        TariffPeriod {
            friendly: "Heures Pleines (Tempo Blanc)",
            short: "HP_BLANC",
            icon: "mdi:white-balance-sunny",
        },
    ),
    (
        "HCJR",
        TariffPeriod {
            friendly: "Heures Creuses (Tempo Rouge)",
            short: "HC_ROUGE",
            icon: "mdi:weather-night",
        },
    ),
    (
        "HPJR",
        TariffPeriod {
            friendly: "Heures Pleines (Tempo Rouge)",
            short: "HP_ROUGE",
            icon: "mdi:white-balance-sunny",
        },
    ),
];

impl TariffPeriod {
    /// Triple returned for empty or unrecognized codes.
    pub const UNKNOWN: TariffPeriod = TariffPeriod {
        friendly: "Inconnu",
        short: "UNK",
        icon: "mdi:clock-alert",
    };

    /// Derive the triple from a raw PTEC code.
    ///
    /// The code is trimmed and uppercased before matching.
    ///
    /// # Examples
    ///
    /// ```
    /// use teleinfo_protocol::TariffPeriod;
    ///
    /// let period = TariffPeriod::from_code("hcjb");
    /// assert_eq!(period.friendly, "Heures Creuses (Tempo Bleu)");
    /// assert_eq!(period.short, "HC_BLEU");
    /// assert!(period.off_peak_active());
    ///
    /// assert_eq!(TariffPeriod::from_code("???"), TariffPeriod::UNKNOWN);
    /// ```
    pub fn from_code(code: &str) -> Self {
        let c = code.trim().to_uppercase();

        for (exact, period) in TEMPO {
            if c == *exact {
                return *period;
            }
        }

        if c.starts_with("HC") {
            return TariffPeriod {
                friendly: "Heures Creuses",
                short: "HC",
                icon: "mdi:weather-night",
            };
        }
        if c.starts_with("HP") {
            return TariffPeriod {
                friendly: "Heures Pleines",
                short: "HP",
                icon: "mdi:white-balance-sunny",
            };
        }
        if c.starts_with("TH") {
            return TariffPeriod {
                friendly: "Toutes Heures",
                short: "TH",
                icon: "mdi:clock-outline",
            };
        }
        if c.starts_with("HN") {
            return TariffPeriod {
                friendly: "Heures Normales",
                short: "HN",
                icon: "mdi:timer-outline",
            };
        }
        if c.starts_with("PM") {
            return TariffPeriod {
                friendly: "Pointe Mobile",
                short: "PM",
                icon: "mdi:flash-alert",
            };
        }

        Self::UNKNOWN
    }

    /// True exactly when the short code starts with `HC`.
    pub fn off_peak_active(&self) -> bool {
        self.short.starts_with("HC")
    }
}
