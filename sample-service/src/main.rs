use std::{num::NonZeroUsize, sync::Arc};

use anyhow::{ensure, Result};
use metering_client::{
    auth::ClientCredentials, series, MeteringClient, SearchFilter, SearchOptions,
};
use sample_service::{config::AppConfig, observability, report};
use time::{Duration, OffsetDateTime, Time};

/// Walkthrough of the DSO flow: look up the configured asset grid
/// assignments, upload synthetic meter readings for them, collect the
/// readings back through the paginated search, print them as CSV, and
/// finally delete them again.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let http = reqwest::Client::builder()
        // Local or corporate environments sometimes present self-signed
        // certificates; the toggle lives in sample-config.toml.
        .danger_accept_invalid_certs(cfg.api.accept_invalid_certs)
        .build()?;

    let tokens = Arc::new(ClientCredentials::new(
        http.clone(),
        &cfg.auth.token_url,
        &cfg.auth.client_id,
        &cfg.auth.client_secret,
        cfg.auth.scope.clone(),
    ));
    let client = MeteringClient::new(http, &cfg.api.base_url, tokens);

    // Confirm the configured assignments exist before generating data for them.
    let assignment_filter =
        SearchFilter::new().one_of("id", cfg.demo.asset_grid_assignment_ids.iter().cloned());
    let options = SearchOptions::new(cfg.demo.asset_grid_assignment_ids.len().max(1), 0, &[]);
    let assignments = client
        .search_asset_grid_assignments(&assignment_filter, &options)
        .await?
        .items;

    if assignments.len() < cfg.demo.asset_grid_assignment_ids.len() {
        tracing::warn!(
            found = assignments.len(),
            configured = cfg.demo.asset_grid_assignment_ids.len(),
            "some configured asset grid assignments were not found"
        );
    }
    ensure!(
        !assignments.is_empty(),
        "no matching asset grid assignments; nothing to demonstrate"
    );
    let ids: Vec<String> = assignments.iter().map(|a| a.id.clone()).collect();

    // Today's first hour(s), UTC, tiled at the configured step.
    let start = OffsetDateTime::now_utc().replace_time(Time::MIDNIGHT);
    let end = start + Duration::hours(cfg.demo.window_hours);
    let readings = series::expand_readings(
        &ids,
        start,
        end,
        Duration::minutes(cfg.demo.step_minutes),
        cfg.demo.reading_value,
    )?;
    tracing::info!(count = readings.len(), "generated synthetic readings");

    client.create_meter_readings(&readings).await?;

    let reading_filter = SearchFilter::new()
        .one_of("assetGridAssignmentId", ids.iter().cloned())
        .period_between("periodFrom", start, end);

    let page_size = NonZeroUsize::new(cfg.demo.page_size)
        .ok_or_else(|| anyhow::anyhow!("demo.page_size must be positive"))?;
    let collected = client
        .collect_meter_readings(&reading_filter, page_size, "periodFrom")
        .await?;
    tracing::info!(count = collected.len(), "collected readings back from the API");

    let csv_from_api = client
        .export_meter_readings_csv(
            &reading_filter,
            &SearchOptions::new(collected.len().max(1), 0, &["periodFrom"]),
        )
        .await?;
    tracing::info!(bytes = csv_from_api.len(), "server-side CSV export fetched");

    println!("{}", report::readings_to_csv(&collected)?);

    let deleted = client.delete_meter_readings(&reading_filter).await?;
    tracing::info!(deleted, "cleaned up demo readings");

    Ok(())
}
