use std::{num::NonZeroUsize, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    auth::{AuthError, TokenSource},
    domain::{AssetGridAssignment, MeterReading},
    filter::{SearchFilter, SearchOptions},
    paging,
};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("remote API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// One bounded batch of records from a single search call.
///
/// `count` is the server-reported total across all pages when the backend
/// supplies one. The collection loop terminates on page length alone; see
/// [`crate::paging::collect_all`].
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    filters: &'a SearchFilter,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: u64,
}

/// Client for the metering REST API.
///
/// Holds no authentication state of its own; a [`TokenSource`] capability is
/// asked for a bearer credential per request.
pub struct MeteringClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl MeteringClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub async fn search_asset_grid_assignments(
        &self,
        filter: &SearchFilter,
        options: &SearchOptions,
    ) -> Result<Page<AssetGridAssignment>, ApiError> {
        self.search("assetgridassignments", filter, options).await
    }

    /// Up to `options.take` readings matching `filter`, sorted ascending by
    /// `options.order_by`, skipping the first `options.skip` matches.
    pub async fn search_meter_readings(
        &self,
        filter: &SearchFilter,
        options: &SearchOptions,
    ) -> Result<Page<MeterReading>, ApiError> {
        self.search("meterreadings", filter, options).await
    }

    /// Submit a batch of readings. The remote store applies the batch as a
    /// whole: an interval conflict on any reading fails the entire call and
    /// nothing is inserted.
    pub async fn create_meter_readings(&self, readings: &[MeterReading]) -> Result<(), ApiError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .post(format!("{}/meterreadings/batch", self.base_url))
            .bearer_auth(token)
            .json(&readings)
            .send()
            .await?;

        check_status(response).await?;
        tracing::debug!(count = readings.len(), "submitted meter readings");
        Ok(())
    }

    /// Delete every reading matching `filter`; returns the deleted count.
    pub async fn delete_meter_readings(&self, filter: &SearchFilter) -> Result<u64, ApiError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .post(format!("{}/meterreadings/delete", self.base_url))
            .bearer_auth(token)
            .json(&SearchBody { filters: filter })
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: DeleteResponse = response.json().await?;
        Ok(body.deleted)
    }

    /// Matching readings rendered as CSV by the remote service.
    pub async fn export_meter_readings_csv(
        &self,
        filter: &SearchFilter,
        options: &SearchOptions,
    ) -> Result<String, ApiError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .post(format!("{}/meterreadings/export", self.base_url))
            .bearer_auth(token)
            .query(&options.to_query())
            .json(&SearchBody { filters: filter })
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// Drain every reading matching `filter` through the paginated search,
    /// sorted ascending by `sort_key`. One request outstanding at a time.
    pub async fn collect_meter_readings(
        &self,
        filter: &SearchFilter,
        page_size: NonZeroUsize,
        sort_key: &str,
    ) -> Result<Vec<MeterReading>, ApiError> {
        paging::collect_all(page_size, |skip, take| {
            let options = SearchOptions::new(take, skip, &[sort_key]);
            async move {
                self.search_meter_readings(filter, &options)
                    .await
                    .map(|page| page.items)
            }
        })
        .await
    }

    async fn search<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &SearchFilter,
        options: &SearchOptions,
    ) -> Result<Page<T>, ApiError> {
        let token = self.tokens.bearer_token().await?;
        tracing::debug!(
            collection,
            take = options.take,
            skip = options.skip,
            "search request"
        );

        let response = self
            .http
            .post(format!("{}/{}/search", self.base_url, collection))
            .bearer_auth(token)
            .query(&options.to_query())
            .json(&SearchBody { filters: filter })
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use time::{macros::datetime, Duration};

    struct MockBackend {
        readings: Vec<MeterReading>,
        search_requests: AtomicUsize,
    }

    fn reading(id: &str, minute: i64) -> MeterReading {
        let start = datetime!(2024-01-01 00:00:00 UTC) + Duration::minutes(minute);
        MeterReading {
            asset_grid_assignment_id: id.to_string(),
            period_from: start,
            period_to: start + Duration::minutes(1),
            average_power_production: 1.0,
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "Bearer test-token")
            .unwrap_or(false)
    }

    async fn mock_search(
        State(state): State<Arc<MockBackend>>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(_body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        state.search_requests.fetch_add(1, Ordering::SeqCst);

        let take: usize = params
            .get("take")
            .and_then(|v| v.parse().ok())
            .ok_or(StatusCode::BAD_REQUEST)?;
        let skip: usize = params
            .get("skip")
            .and_then(|v| v.parse().ok())
            .ok_or(StatusCode::BAD_REQUEST)?;

        let page: Vec<_> = state.readings.iter().skip(skip).take(take).collect();
        Ok(Json(serde_json::json!({
            "items": page,
            "count": state.readings.len(),
        })))
    }

    async fn mock_delete(
        headers: HeaderMap,
        Json(_body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(serde_json::json!({ "deleted": 42 })))
    }

    async fn mock_failure() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn spawn_backend(state: Arc<MockBackend>) -> String {
        let app = Router::new()
            .route("/meterreadings/search", post(mock_search))
            .route("/meterreadings/delete", post(mock_delete))
            .route("/meterreadings/batch", post(mock_failure))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: &str) -> MeteringClient {
        MeteringClient::new(
            reqwest::Client::new(),
            base_url,
            Arc::new(StaticToken("test-token".to_string())),
        )
    }

    #[tokio::test]
    async fn collect_drains_all_pages_in_order() {
        let readings: Vec<_> = (0..250).map(|i| reading("A", i)).collect();
        let state = Arc::new(MockBackend {
            readings: readings.clone(),
            search_requests: AtomicUsize::new(0),
        });
        let base_url = spawn_backend(state.clone()).await;

        let client = client_for(&base_url);
        let collected = client
            .collect_meter_readings(
                &SearchFilter::new().one_of("assetGridAssignmentId", ["A"]),
                NonZeroUsize::new(100).unwrap(),
                "periodFrom",
            )
            .await
            .unwrap();

        assert_eq!(state.search_requests.load(Ordering::SeqCst), 3);
        assert_eq!(collected, readings);
    }

    #[tokio::test]
    async fn delete_returns_server_count() {
        let state = Arc::new(MockBackend {
            readings: Vec::new(),
            search_requests: AtomicUsize::new(0),
        });
        let base_url = spawn_backend(state).await;

        let client = client_for(&base_url);
        let deleted = client
            .delete_meter_readings(&SearchFilter::new().one_of("assetGridAssignmentId", ["A"]))
            .await
            .unwrap();

        assert_eq!(deleted, 42);
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_api_error() {
        let state = Arc::new(MockBackend {
            readings: Vec::new(),
            search_requests: AtomicUsize::new(0),
        });
        let base_url = spawn_backend(state).await;

        let client = client_for(&base_url);
        let err = client
            .create_meter_readings(&[reading("A", 0)])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_by_backend() {
        let state = Arc::new(MockBackend {
            readings: Vec::new(),
            search_requests: AtomicUsize::new(0),
        });
        let base_url = spawn_backend(state).await;

        let client = MeteringClient::new(
            reqwest::Client::new(),
            &base_url,
            Arc::new(StaticToken("wrong".to_string())),
        );
        let err = client
            .search_meter_readings(&SearchFilter::new(), &SearchOptions::new(10, 0, &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 401, .. }));
    }
}
