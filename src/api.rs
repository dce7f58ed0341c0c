use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Horizon requested for every prediction.
pub const PREDICTION_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the server's `error` field when present.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Rate limit exceeded. Please try again in a minute.")]
    RateLimited,

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Quote {
    /// Zero change counts as positive.
    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<f64>>,
}

impl HistorySeries {
    pub fn new(dates: Vec<String>, prices: Vec<f64>) -> Self {
        HistorySeries { dates, prices, volumes: None }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn check(self) -> Result<Self, ApiError> {
        if self.dates.len() != self.prices.len() {
            return Err(ApiError::Malformed(format!(
                "{} dates but {} prices",
                self.dates.len(),
                self.prices.len()
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub symbol: Option<String>,
    pub current_price: f64,
    pub predicted_change: f64,
    pub predicted_change_percent: f64,
    pub predictions: HistorySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// The backend the watchlist reads market data from.
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError>;

    /// `period` is passed through to the backend untouched.
    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<HistorySeries, ApiError>;

    async fn fetch_prediction(&self, symbol: &str, days: u32) -> Result<Prediction, ApiError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError>;
}

pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("stock-watchlist/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(HttpApi { client, base })
    }

    /// `segments` are appended as escaped path segments, so symbols like
    /// `BRK/B` or `^GSPC` cannot escape the route.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, ApiError> {
        log::debug!("GET {url}");
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}

/// Map a response to its payload or an `ApiError`. 429 is reported as a rate
/// limit; other failures carry the body's `error` field, or `HTTP <status>`
/// when the body has none.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        return Err(ApiError::Status { status, message });
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl MarketApi for HttpApi {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        self.get_json(self.endpoint(&["stock", symbol]), &[]).await
    }

    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<HistorySeries, ApiError> {
        let series: HistorySeries = self
            .get_json(self.endpoint(&["history", symbol]), &[("period", period.to_string())])
            .await?;
        series.check()
    }

    async fn fetch_prediction(&self, symbol: &str, days: u32) -> Result<Prediction, ApiError> {
        let mut prediction: Prediction = self
            .get_json(self.endpoint(&["predict", symbol]), &[("days", days.to_string())])
            .await?;
        prediction.predictions = prediction.predictions.check()?;
        Ok(prediction)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let response: SearchResponse = self.get_json(self.endpoint(&["search", query]), &[]).await?;
        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = decode_response::<Quote>(StatusCode::TOO_MANY_REQUESTS, r#"{"error":"slow down"}"#).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        assert_eq!(err.to_string(), "Rate limit exceeded. Please try again in a minute.");
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let err = decode_response::<Quote>(StatusCode::NOT_FOUND, r#"{"error":"Stock not found"}"#).unwrap_err();
        match &err {
            ApiError::Status { status, message } => {
                assert_eq!(*status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Stock not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.to_string(), "Stock not found");
    }

    #[test]
    fn error_without_body_falls_back_to_status() {
        let err = decode_response::<Quote>(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");

        let err = decode_response::<Quote>(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: StatusCode::BAD_GATEWAY, .. }));
    }

    #[test]
    fn success_body_is_decoded() {
        let quote: Quote = decode_response(
            StatusCode::OK,
            r#"{"symbol":"MSFT","name":"Microsoft","price":410.0,"change":2.0,"changePercent":0.49}"#,
        )
        .unwrap();
        assert_eq!(quote.symbol, "MSFT");
        assert_eq!(quote.currency(), "USD");

        let err = decode_response::<Quote>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let api = api("http://localhost:5000/api");
        assert_eq!(api.endpoint(&["stock", "AAPL"]).as_str(), "http://localhost:5000/api/stock/AAPL");

        let api = self::api("http://localhost:5000/api/");
        assert_eq!(api.endpoint(&["history", "MSFT"]).as_str(), "http://localhost:5000/api/history/MSFT");
    }

    #[test]
    fn symbols_are_escaped_as_one_segment() {
        let api = api("http://localhost:5000/api");
        assert_eq!(api.endpoint(&["stock", "BRK/B"]).as_str(), "http://localhost:5000/api/stock/BRK%2FB");
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(matches!(
            HttpApi::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn quote_parses_backend_shape() {
        let quote: Quote = serde_json::from_str(
            r#"{"symbol":"AAPL","name":"Apple Inc.","price":189.5,"currency":"USD","change":-1.25,"changePercent":-0.66}"#,
        )
        .unwrap();
        assert_eq!(quote.change_percent, -0.66);
        assert!(!quote.is_positive());
        assert_eq!(quote.currency(), "USD");
    }

    #[test]
    fn zero_change_is_positive() {
        let quote = Quote {
            symbol: "X".into(),
            name: "X".into(),
            price: 1.0,
            change: 0.0,
            change_percent: 0.0,
            currency: None,
        };
        assert!(quote.is_positive());
    }

    #[test]
    fn prediction_parses_backend_shape() {
        let prediction: Prediction = serde_json::from_str(
            r#"{"symbol":"AAPL","current_price":100.0,"predicted_change":2.5,"predicted_change_percent":2.5,
                "predictions":{"dates":["2024-01-02","2024-01-03"],"prices":[101.0,102.5]}}"#,
        )
        .unwrap();
        assert_eq!(prediction.predictions.len(), 2);
        assert_eq!(prediction.predictions.volumes, None);
    }

    #[test]
    fn mismatched_series_is_malformed() {
        let series = HistorySeries::new(vec!["d1".into()], vec![1.0, 2.0]);
        assert!(matches!(series.check(), Err(ApiError::Malformed(_))));
    }
}
