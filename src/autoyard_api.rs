// Client for the AutoYard car listing API: search, car details and the make/model catalog

use futures::future::try_join_all;
use reqwest::{
    Client, RequestBuilder, StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    config::{ApiSettings, Settings},
    error::{ApiError, FailureKind},
    filters::{FilterValue, RawFilters, normalize_filters},
    models::{Car, Make, Model, SearchFilters},
};

const USER_AGENT: &str = "autoyard-rust/0.1";

// Fallback messages when the server gives us nothing better
const SEARCH_NOT_SUCCESSFUL: &str = "API request was not successful";
const SEARCH_FAILED: &str = "Failed to fetch cars";
const DETAIL_FAILED: &str = "Failed to fetch car details";
const CATALOG_FAILED: &str = "Failed to fetch catalog";

// One page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub cars: Vec<Car>,
    pub total: u64,
}

// --- Response envelopes ---

// `{success, data, error}` plus the result count of the list endpoint.
// One API version reports the count as `total`, the other as `count`;
// both are read here and folded into one number by `result_count`.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    success: Option<bool>,
    data: Option<T>,
    error: Option<String>,
    total: Option<u64>,
    count: Option<u64>,
}

impl<T> Envelope<T> {
    fn result_count(&self) -> u64 {
        self.total.or(self.count).unwrap_or(0)
    }
}

// Just enough of an error body to get the server's message out of a non-2xx answer
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    error: Option<String>,
}

// Why a single round trip failed, before it is mapped onto an operation error
#[derive(Debug)]
struct RemoteFailure {
    kind: FailureKind,
    status: Option<StatusCode>,
    message: Option<String>,
}

impl RemoteFailure {
    fn network(message: Option<String>) -> Self {
        Self { kind: FailureKind::Network, status: None, message }
    }

    fn message_or(self, fallback: &str) -> String {
        self.message.unwrap_or_else(|| fallback.to_string())
    }

    fn is_retriable(&self) -> bool {
        self.kind == FailureKind::Network || self.status.is_some_and(|s| s.is_server_error())
    }
}

// Timeout/retry policy used by the catalog calls only
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    timeout: Duration,
    retries: u32,
    delay: Duration,
}

pub struct AutoyardClient {
    client: Client,
    base_url: Url,
    resource: String,
    order_field: String,
    page_size: u32,
    catalog_policy: RetryPolicy,
}

impl AutoyardClient {
    // Client for the API selected by the configured environment
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        Self::with_base_url(settings.api_base_url(), &settings.api)
    }

    // Client pointed at an explicit base URL (mock servers in tests)
    pub fn with_base_url(base_url: &str, api: &ApiSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Setup(format!("failed to build reqwest client: {}", e)))?;

        // Exactly one trailing slash so joins append below the base path
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ApiError::Setup(format!("invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            resource: api.resource.trim_matches('/').to_string(),
            order_field: api.order_field.clone(),
            page_size: api.page_size,
            catalog_policy: RetryPolicy {
                timeout: Duration::from_millis(api.catalog_timeout_ms),
                retries: api.catalog_retries,
                delay: Duration::from_millis(api.catalog_retry_delay_ms),
            },
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // --- Search ---

    /// Searches one page of listings with typed filters and the configured page size.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: u32,
    ) -> Result<SearchPage, ApiError> {
        self.search_cars(query, &RawFilters::from(filters), page, self.page_size)
            .await
    }

    /// Searches one page of listings, newest ingested first.
    ///
    /// `page` is 1-based and `limit` must be positive. Filters are normalized
    /// before sending; an empty `query` is left out of the request body.
    pub async fn search_cars(
        &self,
        query: &str,
        filters: &RawFilters,
        page: u32,
        limit: u32,
    ) -> Result<SearchPage, ApiError> {
        if page == 0 {
            return Err(ApiError::InvalidRequest("page numbers start at 1".to_string()));
        }
        if limit == 0 {
            return Err(ApiError::InvalidRequest("limit must be positive".to_string()));
        }
        let offset = page_offset(page, limit);

        let mut body = normalize_filters(filters);
        if !query.is_empty() {
            body.insert("query".to_string(), FilterValue::from(query));
        }
        tracing::debug!(page, limit, offset, params = ?body, "Searching cars");

        let url = self.list_url(limit, offset)?;
        let request = self.client.post(url).json(&body);

        let envelope: Envelope<Vec<Car>> = match send_envelope(request).await {
            Ok(envelope) if envelope.success == Some(true) => envelope,
            Ok(envelope) => {
                let message = envelope.error.unwrap_or_else(|| SEARCH_NOT_SUCCESSFUL.to_string());
                tracing::error!(page, error = %message, "Error fetching cars");
                return Err(ApiError::SearchFailed { kind: FailureKind::Api, message });
            }
            Err(failure) => {
                tracing::error!(page, failure = ?failure, "Error fetching cars");
                let fallback = match failure.kind {
                    FailureKind::Api => SEARCH_NOT_SUCCESSFUL,
                    _ => SEARCH_FAILED,
                };
                return Err(ApiError::SearchFailed {
                    kind: failure.kind,
                    message: failure.message_or(fallback),
                });
            }
        };

        let total = envelope.result_count();
        let cars = envelope.data.unwrap_or_default();
        tracing::info!("Fetched {} cars. Total available: {}", cars.len(), total);
        Ok(SearchPage { cars, total })
    }

    // --- Details ---

    /// Fetches a single listing by id.
    pub async fn get_car_by_id(&self, car_id: i64) -> Result<Car, ApiError> {
        let url = self.join(&format!("{}/{}", self.resource, car_id))?;
        let request = self.client.get(url);

        let failure = match send_envelope::<Car>(request).await {
            Ok(Envelope { success: Some(true), data: Some(car), .. }) => return Ok(car),
            Ok(envelope) => RemoteFailure {
                kind: if envelope.success == Some(true) { FailureKind::Decode } else { FailureKind::Api },
                status: None,
                message: envelope.error,
            },
            Err(failure) => failure,
        };

        tracing::error!(car_id, failure = ?failure, "Error fetching car");
        if failure.status == Some(StatusCode::NOT_FOUND) {
            let message = failure
                .message
                .unwrap_or_else(|| format!("Car {} not found", car_id));
            return Err(ApiError::NotFound { id: car_id, message });
        }
        Err(ApiError::FetchFailed {
            id: car_id,
            kind: failure.kind,
            message: failure.message_or(DETAIL_FAILED),
        })
    }

    /// Fetches several listings concurrently, in the order of `car_ids`.
    ///
    /// All requests are started at once; the first failure fails the whole
    /// batch and no partial list is returned.
    pub async fn get_cars_by_ids(&self, car_ids: &[i64]) -> Result<Vec<Car>, ApiError> {
        let fetches = car_ids.iter().map(|&id| self.get_car_by_id(id));
        try_join_all(fetches).await.map_err(|e| {
            tracing::error!(ids = ?car_ids, error = %e, "Error fetching multiple cars");
            e
        })
    }

    // --- Catalog (timeout + retry enabled) ---

    pub async fn fetch_makes(&self) -> Result<Vec<Make>, ApiError> {
        let url = self.join("sys/makes")?;
        self.fetch_catalog(url).await
    }

    pub async fn fetch_models(&self, make_id: i64) -> Result<Vec<Model>, ApiError> {
        let mut url = self.join("sys/models")?;
        url.query_pairs_mut().append_pair("make_id", &make_id.to_string());
        self.fetch_catalog(url).await
    }

    async fn fetch_catalog<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, ApiError> {
        let policy = self.catalog_policy;
        let attempts = policy.retries + 1;

        for attempt in 0..attempts {
            tracing::debug!(url = %url, attempt, "Catalog fetch attempt {}/{}", attempt + 1, attempts);
            let request = self.client.get(url.clone()).timeout(policy.timeout);

            let failure = match send_envelope::<Vec<T>>(request).await {
                Ok(envelope) if envelope.success != Some(false) => {
                    return Ok(envelope.data.unwrap_or_default());
                }
                Ok(envelope) => RemoteFailure {
                    kind: FailureKind::Api,
                    status: None,
                    message: envelope.error,
                },
                Err(failure) => failure,
            };

            if !failure.is_retriable() || attempt + 1 == attempts {
                tracing::error!(url = %url, attempt, failure = ?failure, "Catalog fetch failed");
                return Err(ApiError::CatalogFailed {
                    kind: failure.kind,
                    message: failure.message_or(CATALOG_FAILED),
                });
            }
            tracing::warn!(url = %url, attempt, failure = ?failure, "Catalog fetch failed. Retrying...");
            sleep(policy.delay).await;
        }

        // Only reachable with zero attempts, which `retries + 1` rules out
        Err(ApiError::CatalogFailed {
            kind: FailureKind::Network,
            message: CATALOG_FAILED.to_string(),
        })
    }

    // --- URL helpers ---

    fn join(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid request path '{}': {}", path, e)))
    }

    fn list_url(&self, limit: u32, offset: u64) -> Result<Url, ApiError> {
        let mut url = self.join(&format!("{}/list", self.resource))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("order", &self.order_field)
            .append_pair("order_type", "DESC");
        Ok(url)
    }
}

// Offset of the first listing on a 1-based page
pub fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}

// Sends a request and decodes the JSON envelope. Non-2xx answers become Api
// failures carrying the server's message when the body has one.
async fn send_envelope<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Envelope<T>, RemoteFailure> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!(error = %e, "Network error during request");
        RemoteFailure::network(None)
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| {
        tracing::warn!(status = %status, error = %e, "Failed to read response body");
        RemoteFailure::network(None)
    })?;

    if !status.is_success() {
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        tracing::debug!(status = %status, response_body = %String::from_utf8_lossy(&bytes), "HTTP error details");
        return Err(RemoteFailure {
            kind: FailureKind::Api,
            status: Some(status),
            message: body.error,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, response_body = %String::from_utf8_lossy(&bytes), "JSON parse error details");
        RemoteFailure {
            kind: FailureKind::Decode,
            status: Some(status),
            message: None,
        }
    })
}
