use time::{Duration, OffsetDateTime};

use crate::domain::MeterReading;

#[derive(thiserror::Error, Debug)]
pub enum SeriesError {
    #[error("step must be positive, got {0}")]
    NonPositiveStep(Duration),
}

/// Expand a half-open time window into synthetic per-assignment readings.
///
/// The window `[from, to)` is tiled into consecutive `step`-sized intervals;
/// for each interval one reading per assignment id is produced, carrying the
/// given constant value. Readings are entity-major within each step: all
/// assignments for interval *i* precede any assignment of interval *i+1*.
///
/// `from >= to` yields an empty series. The output is deterministic for
/// identical inputs and the function has no side effects.
pub fn expand_readings(
    assignment_ids: &[String],
    from: OffsetDateTime,
    to: OffsetDateTime,
    step: Duration,
    value: f64,
) -> Result<Vec<MeterReading>, SeriesError> {
    if !step.is_positive() {
        return Err(SeriesError::NonPositiveStep(step));
    }

    let mut readings = Vec::new();
    let mut cursor = from;
    while cursor < to {
        let period_to = cursor + step;
        for id in assignment_ids {
            readings.push(MeterReading {
                asset_grid_assignment_id: id.clone(),
                period_from: cursor,
                period_to,
                average_power_production: value,
            });
        }
        cursor = period_to;
    }

    Ok(readings)
}
