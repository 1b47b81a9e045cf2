use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One measurement over a half-open interval `[period_from, period_to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    pub asset_grid_assignment_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub period_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_to: OffsetDateTime,
    pub average_power_production: f64,
}
