//! Text-to-number cleaning rules applied to scraped element text.

use serde::{Deserialize, Serialize};

/// How raw element text is reduced to a bare numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningRule {
    /// Chart labels such as `24.5%IV`: drop `%`, then the `IV` label on either end.
    Percent,
    /// Valuation figures such as `182.40 USD`: drop the currency label and quotes.
    Currency,
    /// Quote fields such as `1,234.56`: drop thousands separators.
    Grouped,
}

impl CleaningRule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Currency => "currency",
            Self::Grouped => "grouped",
        }
    }

    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::Percent => raw
                .replace('%', "")
                .trim()
                .trim_matches(|ch| ch == 'I' || ch == 'V')
                .trim()
                .to_owned(),
            Self::Currency => raw
                .trim()
                .trim_matches(|ch| matches!(ch, 'U' | 'S' | 'D'))
                .replace('"', "")
                .trim()
                .to_owned(),
            Self::Grouped => raw.trim().replace(',', ""),
        }
    }
}
