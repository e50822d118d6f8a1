//! Filing periods and frequencies.
//!
//! A compliance instance covers exactly one period. Which form applies
//! depends on the compliance type's frequency: monthly returns carry a
//! return period (`2024-06`), yearly filings carry a financial year
//! (`2023-24`) or an assessment year (`2024-25`).

use serde::{Deserialize, Serialize};

/// How often a compliance type recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => f.write_str("MONTHLY"),
            Self::Yearly => f.write_str("YEARLY"),
        }
    }
}

/// The period a compliance instance covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    FinancialYear(String),
    AssessmentYear(String),
    ReturnPeriod(String),
}

impl Period {
    /// The raw period label.
    pub fn label(&self) -> &str {
        match self {
            Self::FinancialYear(s) | Self::AssessmentYear(s) | Self::ReturnPeriod(s) => s,
        }
    }

    /// Whether this period form is the one used by `frequency`.
    pub fn fits(&self, frequency: Frequency) -> bool {
        match (self, frequency) {
            (Self::ReturnPeriod(_), Frequency::Monthly) => true,
            (Self::FinancialYear(_) | Self::AssessmentYear(_), Frequency::Yearly) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FinancialYear(s) => write!(f, "FY {s}"),
            Self::AssessmentYear(s) => write!(f, "AY {s}"),
            Self::ReturnPeriod(s) => write!(f, "{s}"),
        }
    }
}
