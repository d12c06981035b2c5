//! Rate-limited access to the hosting platform's REST API.
//!
//! Every request goes through [`Client::call`], which applies the bounded
//! [`RetryPolicy`] to transient failures, refuses to retry the abuse signal,
//! and holds a permit from a shared semaphore while the request is in flight.
//! List endpoints are exposed as one lazy stream by [`Client::list`].

pub mod pagination;
pub mod retry;
pub mod throttle;

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use backon::Retryable;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use octocrab::Octocrab;
use reqwest::header::LINK;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::error::ApiError;

pub use retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the API root, or an absolute URL for page cursors.
    pub route: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(route: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            route: route.into(),
            body: None,
        }
    }

    pub fn post(route: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            route: route.into(),
            body: Some(body),
        }
    }

    pub fn put(route: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Put,
            route: route.into(),
            body: Some(body),
        }
    }

    pub fn patch(route: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Patch,
            route: route.into(),
            body: Some(body),
        }
    }

    pub fn delete(route: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            route: route.into(),
            body: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// `Null` for empty bodies such as `204 No Content`.
    pub body: serde_json::Value,
    /// Cursor to the following page of a list endpoint.
    pub next: Option<String>,
}

#[derive(Clone)]
pub struct Client {
    octocrab: Arc<Octocrab>,
    base_url: Url,
    retry: RetryPolicy,
    in_flight: Arc<Semaphore>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .field("available_permits", &self.in_flight.available_permits())
            .finish()
    }
}

impl Client {
    /// Builds an authenticated client.
    ///
    /// `max_in_flight` bounds concurrent requests across every clone of the
    /// client; zero is treated as one.
    pub fn new(
        token: &str,
        base_url: &str,
        retry: RetryPolicy,
        max_in_flight: usize,
    ) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_url(base_url.clone())
            .and_then(|builder| builder.build())
            .map_err(|e| ApiError::network(format!("could not build http client: {e}")))?;

        Ok(Self {
            octocrab: Arc::new(octocrab),
            base_url,
            retry,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        })
    }

    fn url_for(&self, route: &str) -> Result<Url, ApiError> {
        let parsed = if route.starts_with("http://") || route.starts_with("https://") {
            Url::parse(route)
        } else {
            self.base_url.join(route.trim_start_matches('/'))
        };

        parsed.map_err(|e| ApiError::InvalidUrl {
            url: route.to_string(),
            message: e.to_string(),
        })
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.route)?;
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| ApiError::Cancelled)?;

        let body = request.body.as_ref();
        let sent = match request.method {
            HttpMethod::Get => self.octocrab._get(url, None::<&()>).await,
            HttpMethod::Post => self.octocrab._post(url, body).await,
            HttpMethod::Put => self.octocrab._put(url, body).await,
            HttpMethod::Patch => self.octocrab._patch(url, body).await,
            HttpMethod::Delete => self.octocrab._delete(url, body).await,
        };
        let response = sent.map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let next = headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(pagination::next_link);
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(throttle::error_from_response(
                status,
                &headers,
                &text,
                SystemTime::now(),
            ));
        }

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::decode(e.to_string()))?
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
            next,
        })
    }

    /// Sends one logical request, retrying transient failures within the
    /// policy bound. The abuse signal fails on the first occurrence.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let result = (|| self.send_once(request))
            .retry(self.retry.backoff())
            .when(ApiError::is_transient)
            .adjust(|err, scheduled| self.retry.adjust(err.retry_after(), scheduled))
            .notify(|err, delay| {
                if let ApiError::RateLimited { .. } = err {
                    tracing::warn!(
                        method = %request.method,
                        route = %request.route,
                        "Request quota exhausted for request {} {}",
                        request.method,
                        request.route
                    );
                }
                tracing::info!(
                    method = %request.method,
                    route = %request.route,
                    "Retrying after {:?}: {}",
                    delay,
                    err
                );
            })
            .await;

        match &result {
            Err(err @ ApiError::Abuse { .. }) => tracing::warn!(
                method = %request.method,
                route = %request.route,
                "Abuse detected for request {} {}, not retrying: {}",
                request.method,
                request.route,
                err
            ),
            Err(err) if err.is_transient() => tracing::warn!(
                method = %request.method,
                route = %request.route,
                "Giving up after {} retries: {}",
                self.retry.max_retries,
                err
            ),
            _ => {}
        }

        result
    }

    /// Lazily walks every page of a list endpoint.
    ///
    /// Each call starts from `route` with a fresh cursor; a failed page ends
    /// the stream with that error.
    pub fn list<'a, T>(&'a self, route: impl Into<String>) -> BoxStream<'a, Result<T, ApiError>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        stream::try_unfold(Some(route.into()), move |cursor| async move {
            let route = match cursor {
                Some(route) => route,
                None => return Ok(None),
            };

            let response = self.call(&ApiRequest::get(route)).await?;
            let items: Vec<T> = serde_json::from_value(response.body)
                .map_err(|e| ApiError::decode(e.to_string()))?;

            Ok(Some((
                stream::iter(items.into_iter().map(Ok::<T, ApiError>)),
                response.next,
            )))
        })
        .try_flatten()
        .boxed()
    }

    pub async fn list_all<T>(&self, route: impl Into<String>) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        self.list(route).try_collect().await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    // `Url::join` drops the last path segment unless it ends with a slash,
    // which matters for enterprise hosts such as `https://host/api/v3`.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}
