use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Departures,
    Weather,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Departures => write!(f, "departures"),
            DataKind::Weather => write!(f, "weather"),
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    /// Stops visited this round, whether or not their fetch succeeded.
    pub stops_processed: usize,
    pub departures_saved: usize,
    pub departures_failed: usize,
    /// `None` when weather output is disabled.
    pub weather_saved: Option<bool>,
    /// Set when the round stopped early because shutdown was requested.
    pub cancelled: bool,
}
