use anyhow::Result;
use metering_client::domain::MeterReading;
use time::format_description::well_known::Rfc3339;

/// Render collected readings as CSV with a header row.
///
/// Columns: asset_grid_assignment_id, period_from, period_to (RFC 3339),
/// average_power_production.
pub fn readings_to_csv(readings: &[MeterReading]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "asset_grid_assignment_id",
        "period_from",
        "period_to",
        "average_power_production",
    ])?;

    for reading in readings {
        let period_from = reading.period_from.format(&Rfc3339)?;
        let period_to = reading.period_to.format(&Rfc3339)?;
        let value = reading.average_power_production.to_string();
        writer.write_record([
            reading.asset_grid_assignment_id.as_str(),
            period_from.as_str(),
            period_to.as_str(),
            value.as_str(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::datetime, Duration};

    #[test]
    fn renders_header_and_one_row_per_reading() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let readings = vec![
            MeterReading {
                asset_grid_assignment_id: "A".to_string(),
                period_from: start,
                period_to: start + Duration::minutes(1),
                average_power_production: 1.0,
            },
            MeterReading {
                asset_grid_assignment_id: "B".to_string(),
                period_from: start,
                period_to: start + Duration::minutes(1),
                average_power_production: 2.5,
            },
        ];

        let csv = readings_to_csv(&readings).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "asset_grid_assignment_id,period_from,period_to,average_power_production",
                "A,2024-01-01T00:00:00Z,2024-01-01T00:01:00Z,1",
                "B,2024-01-01T00:00:00Z,2024-01-01T00:01:00Z,2.5",
            ]
        );
    }

    #[test]
    fn empty_input_renders_header_only() {
        let csv = readings_to_csv(&[]).unwrap();
        assert_eq!(
            csv.trim_end(),
            "asset_grid_assignment_id,period_from,period_to,average_power_production"
        );
    }
}
