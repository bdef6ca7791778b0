//! Temporal aggregation of a sample product.

use std::fmt;

use serde::{Deserialize, Serialize};

const MEAN_CELL_METHODS: &str = "time: area: mean (interval: 60 minutes interval: 3 km)";
const SUM_CELL_METHODS: &str = "time: area: sum (interval: 60 minutes interval: 3 km)";

/// Whether fields represent daily aggregates or instantaneous snapshots.
///
/// The only behavioural difference is the `cell_methods` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Daily,
    Instantaneous,
}

impl Aggregation {
    /// `cell_methods` of a field variable, if it carries one.
    pub fn cell_methods(&self, variable: &str) -> Option<&'static str> {
        match self {
            Aggregation::Instantaneous => None,
            Aggregation::Daily => match variable {
                "cfc" | "sis" => Some(MEAN_CELL_METHODS),
                "nobs" => Some(SUM_CELL_METHODS),
                _ => None,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Daily => "daily",
            Aggregation::Instantaneous => "instantaneous",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_cell_methods() {
        let daily = Aggregation::Daily;
        assert!(daily.cell_methods("cfc").unwrap().contains("mean"));
        assert!(daily.cell_methods("sis").unwrap().contains("mean"));
        assert!(daily.cell_methods("nobs").unwrap().contains("sum"));
        assert_eq!(daily.cell_methods("quality"), None);
    }

    #[test]
    fn test_instantaneous_has_no_cell_methods() {
        for var in ["cfc", "nobs", "sis"] {
            assert_eq!(Aggregation::Instantaneous.cell_methods(var), None);
        }
    }
}
