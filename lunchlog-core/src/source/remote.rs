//! REST client for the lunch backend.
//!
//! The trait is synchronous, so the client owns a current-thread tokio runtime
//! and blocks on each request.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{validate_rating, LunchSource};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{HistoryRecord, Location, Recommendations, Restaurant, RestaurantDetail};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

const KAKAO_DEFAULT_IMAGE: &str = "/images/restaurant-default.jpg";
const KAKAO_DEFAULT_DESCRIPTION: &str = "음식점";
const KAKAO_DEFAULT_CATEGORY: &str = "기타";
const KAKAO_MISSING_ADDRESS: &str = "주소 정보 없음";
const KAKAO_DEFAULT_RATING: f64 = 4.0;

pub struct RemoteSource {
    base_url: String,
    max_retries: usize,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl RemoteSource {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to build tokio runtime: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            max_retries: config.max_retries,
            runtime,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retries on transient failures
    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.runtime.block_on(self.get_with_retry(path, query))
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut last_error = None;
        let mut delay = INITIAL_RETRY_DELAY;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying GET {} (attempt {}/{}), waiting {:?}",
                    path,
                    attempt + 1,
                    self.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_RETRY_DELAY);
            }

            match self.get_once(path, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    tracing::warn!("Transient error on GET {}: {}", path, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("max retries exceeded".to_string())))
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("API Request: GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| request_error("GET", path, e))?;
        let body = read_body("GET", path, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Mutations are sent once; failures go straight back to the caller
    fn send<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String> {
        self.runtime.block_on(async {
            tracing::debug!("API Request: {} {}", method, path);
            let mut request = self.http.request(method.clone(), self.url(path));
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request
                .send()
                .await
                .map_err(|e| request_error(method.as_str(), path, e))?;
            read_body(method.as_str(), path, response).await
        })
    }
}

fn request_error(method: &str, path: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{} {}", method, path))
    } else {
        Error::Network(format!("{} {}: {}", method, path, e))
    }
}

async fn read_body(method: &str, path: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| request_error(method, path, e))?;
    tracing::debug!("API Response: {} {}", status.as_u16(), path);

    if status.is_success() {
        Ok(body)
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}

/// Replace a 404 with a domain-specific not-found error
fn not_found(err: Error, replacement: Error) -> Error {
    match err {
        Error::Api { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => replacement,
        other => other,
    }
}

fn location_query(at: Location) -> Vec<(&'static str, String)> {
    vec![
        ("lat", at.latitude.to_string()),
        ("lng", at.longitude.to_string()),
    ]
}

fn timestamp_param(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A place as returned by the backend's Kakao proxy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KakaoPlace {
    name: String,
    category: String,
    distance: f64,
    address: String,
    road_address: String,
    lat: f64,
    lng: f64,
    url: String,
    phone: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Kakao places carry no stable id; ids are assigned by position (1-based).
fn kakao_to_restaurant(index: usize, place: KakaoPlace) -> Restaurant {
    let category = non_empty(place.category);
    let address = non_empty(place.address)
        .or_else(|| non_empty(place.road_address.clone()))
        .unwrap_or_else(|| KAKAO_MISSING_ADDRESS.to_string());

    Restaurant {
        id: index as i64 + 1,
        name: place.name,
        description: category
            .clone()
            .unwrap_or_else(|| KAKAO_DEFAULT_DESCRIPTION.to_string()),
        category: category.unwrap_or_else(|| KAKAO_DEFAULT_CATEGORY.to_string()),
        image: KAKAO_DEFAULT_IMAGE.to_string(),
        address,
        rating: KAKAO_DEFAULT_RATING,
        distance: place.distance,
        latitude: place.lat,
        longitude: place.lng,
        url: non_empty(place.url),
        phone: non_empty(place.phone),
        road_address: non_empty(place.road_address),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRequest {
    restaurant_id: i64,
}

#[derive(Deserialize)]
struct HistoryCreated {
    id: i64,
}

#[derive(Serialize)]
struct PreferenceRequest<'a> {
    rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

impl LunchSource for RemoteSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn restaurants(&self, at: Location, category: Option<&str>) -> Result<Vec<Restaurant>> {
        let mut query = location_query(at);
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        self.get("/api/restaurants", &query)
    }

    fn nearby(&self, at: Location, radius_m: f64) -> Result<Vec<Restaurant>> {
        let mut query = location_query(at);
        query.push(("radius", (radius_m.round() as i64).to_string()));
        let places: Vec<KakaoPlace> = self.get("/api/restaurants/kakao-nearby", &query)?;
        Ok(places
            .into_iter()
            .enumerate()
            .map(|(i, p)| kakao_to_restaurant(i, p))
            .collect())
    }

    fn recommend(&self, at: Location) -> Result<Recommendations> {
        self.get("/api/restaurants/random", &location_query(at))
    }

    fn restaurant_detail(&self, id: i64) -> Result<RestaurantDetail> {
        self.get(&format!("/api/restaurants/{}", id), &[])
            .map_err(|e| not_found(e, Error::RestaurantNotFound(id)))
    }

    fn restaurants_by_category(&self, category: &str) -> Result<Vec<Restaurant>> {
        self.get(
            &format!(
                "/api/restaurants/category/{}",
                urlencoding::encode(category)
            ),
            &[],
        )
    }

    fn search(&self, query: &str) -> Result<Vec<Restaurant>> {
        self.get("/api/restaurants/search", &[("q", query.to_string())])
    }

    fn history(&self) -> Result<Vec<HistoryRecord>> {
        self.get("/api/history", &[])
    }

    fn history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        self.get(
            "/api/history/range",
            &[
                ("startDate", timestamp_param(start)),
                ("endDate", timestamp_param(end)),
            ],
        )
    }

    fn record_selection(&self, restaurant_id: i64) -> Result<i64> {
        let body = self
            .send(
                reqwest::Method::POST,
                "/api/history",
                Some(&HistoryRequest { restaurant_id }),
            )
            .map_err(|e| not_found(e, Error::RestaurantNotFound(restaurant_id)))?;
        let created: HistoryCreated = serde_json::from_str(&body)?;
        Ok(created.id)
    }

    fn delete_history(&self, id: i64) -> Result<()> {
        self.send::<()>(
            reqwest::Method::DELETE,
            &format!("/api/history/{}", id),
            None,
        )
        .map_err(|e| not_found(e, Error::HistoryNotFound(id)))?;
        Ok(())
    }

    fn update_preference(
        &self,
        restaurant_id: i64,
        rating: f64,
        comment: Option<&str>,
    ) -> Result<()> {
        validate_rating(rating)?;
        self.send(
            reqwest::Method::PUT,
            &format!("/api/preferences/{}", restaurant_id),
            Some(&PreferenceRequest { rating, comment }),
        )
        .map_err(|e| not_found(e, Error::RestaurantNotFound(restaurant_id)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves `responses` in order, one per connection, on a local port.
    ///
    /// Returns the base URL and a count of requests answered so far.
    fn serve_in_order(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let served = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&served);

        std::thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };

                // None of these requests carry a body, so headers are enough
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Unknown"),
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        (base_url, served)
    }

    fn source_for(base_url: String, max_retries: usize) -> RemoteSource {
        RemoteSource::new(&ApiConfig {
            base_url,
            timeout_secs: 5,
            max_retries,
        })
        .unwrap()
    }

    #[test]
    fn test_kakao_mapping_defaults() {
        let place: KakaoPlace = serde_json::from_str(
            r#"{
                "id": "12345",
                "name": "동네 국밥",
                "category": "",
                "distance": 230,
                "address": "",
                "road_address": "서울 중구 세종대로 110",
                "lat": 37.5663,
                "lng": 126.9779,
                "url": "http://place.map.kakao.com/12345",
                "phone": "",
                "category_group": "음식점"
            }"#,
        )
        .unwrap();

        let r = kakao_to_restaurant(2, place);
        assert_eq!(r.id, 3);
        assert_eq!(r.category, KAKAO_DEFAULT_CATEGORY);
        assert_eq!(r.description, KAKAO_DEFAULT_DESCRIPTION);
        assert_eq!(r.image, KAKAO_DEFAULT_IMAGE);
        assert_eq!(r.address, "서울 중구 세종대로 110");
        assert_eq!(r.rating, 4.0);
        assert_eq!(r.distance, 230.0);
        assert_eq!(r.phone, None);
        assert_eq!(r.url.as_deref(), Some("http://place.map.kakao.com/12345"));
    }

    #[test]
    fn test_kakao_mapping_keeps_category() {
        let place = KakaoPlace {
            name: "스시 오마카세".to_string(),
            category: "음식점 > 일식 > 초밥".to_string(),
            ..Default::default()
        };
        let r = kakao_to_restaurant(0, place);
        assert_eq!(r.id, 1);
        assert_eq!(r.category, "음식점 > 일식 > 초밥");
        assert_eq!(r.description, r.category);
        assert_eq!(r.address, KAKAO_MISSING_ADDRESS);
    }

    #[test]
    fn test_not_found_mapping() {
        let err = not_found(
            Error::Api {
                status: 404,
                message: "식당을 찾을 수 없습니다.".to_string(),
            },
            Error::RestaurantNotFound(7),
        );
        assert!(matches!(err, Error::RestaurantNotFound(7)));

        let err = not_found(
            Error::Api {
                status: 500,
                message: String::new(),
            },
            Error::RestaurantNotFound(7),
        );
        assert!(matches!(err, Error::Api { status: 500, .. }));
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(HistoryRequest { restaurant_id: 4 }).unwrap();
        assert_eq!(body, serde_json::json!({ "restaurantId": 4 }));

        let body = serde_json::to_value(PreferenceRequest {
            rating: 4.5,
            comment: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "rating": 4.5 }));
    }

    #[test]
    fn test_url_building() {
        let source = RemoteSource::new(&ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(source.url("/api/history"), "http://localhost:8000/api/history");
        assert_eq!(
            timestamp_param(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()),
            "2024-01-09T00:00:00.000Z"
        );
    }

    #[test]
    fn test_invalid_rating_rejected_before_request() {
        let source = RemoteSource::new(&ApiConfig::default()).unwrap();
        assert!(matches!(
            source.update_preference(1, 6.0, None),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unreachable_backend_is_network_error() {
        // Grab a free port, then close it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = RemoteSource::new(&ApiConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            timeout_secs: 2,
            max_retries: 0,
        })
        .unwrap();

        let err = source.history().unwrap_err();
        assert!(matches!(err, Error::Network(_)), "got {:?}", err);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_get_retries_server_error_then_succeeds() {
        let (base_url, served) = serve_in_order(vec![
            (503, r#"{"detail":"busy"}"#),
            (200, "[]"),
            (404, r#"{"detail":"기록을 찾을 수 없습니다."}"#),
        ]);
        let source = source_for(base_url, 2);

        let history = source.history().unwrap();
        assert!(history.is_empty());
        assert_eq!(served.load(Ordering::SeqCst), 2);

        let err = source.delete_history(42).unwrap_err();
        assert!(matches!(err, Error::HistoryNotFound(42)), "got {:?}", err);
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_get_does_not_retry_client_error() {
        let (base_url, served) = serve_in_order(vec![
            (400, r#"{"detail":"bad request"}"#),
            (200, "[]"),
        ]);
        let source = source_for(base_url, 2);

        let err = source.history().unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, .. }), "got {:?}", err);
        assert!(!err.is_retryable());
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mutation_is_not_retried() {
        let (base_url, served) = serve_in_order(vec![
            (503, r#"{"detail":"busy"}"#),
            (200, r#"{"id":1}"#),
        ]);
        let source = source_for(base_url, 2);

        let err = source.delete_history(1).unwrap_err();
        assert!(matches!(err, Error::Api { status: 503, .. }), "got {:?}", err);
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }
}
