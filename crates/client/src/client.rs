//! HTTP transport for the lunchlab REST API.

use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, truncate_body};

/// Low-level client: authentication, JSON bodies and status mapping.
///
/// Paths are relative to the configured base URL. Every call takes an optional
/// access token that replaces the configured API key for that request.
#[derive(Debug, Clone)]
pub struct PayloadClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PayloadClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(concat!("lunchlab-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<R> {
        self.send(self.request(Method::GET, path, token), path).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B, token: Option<&str>) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = with_json(self.request(Method::POST, path, token), body)?;
        self.send(request, path).await
    }

    /// POST without a body.
    pub async fn post_empty<R: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<R> {
        self.send(self.request(Method::POST, path, token), path).await
    }

    pub async fn patch<B, R>(&self, path: &str, body: &B, token: Option<&str>) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = with_json(self.request(Method::PATCH, path, token), body)?;
        self.send(request, path).await
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<R> {
        self.send(self.request(Method::DELETE, path, token), path).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");

        match token.or(self.api_key.as_deref()) {
            Some(credential) => request.bearer_auth(credential),
            None => request,
        }
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> ClientResult<R> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(
                path = %path,
                status = %status,
                body = %truncate_body(&body),
                "Request failed"
            );
            return Err(status_error(status, body));
        }

        serde_json::from_str(&body).map_err(|source| {
            let type_name = std::any::type_name::<R>();
            warn!(
                path = %path,
                type_name,
                error = %source,
                content = %truncate_body(&body),
                "Could not decode response"
            );
            ClientError::Deserialization {
                type_name,
                content: body,
                source,
            }
        })
    }
}

fn with_json<B: Serialize + ?Sized>(request: RequestBuilder, body: &B) -> ClientResult<RequestBuilder> {
    let bytes = serde_json::to_vec(body).map_err(ClientError::Serialization)?;
    Ok(request
        .header(header::CONTENT_TYPE, "application/json")
        .body(bytes))
}

fn status_error(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(body),
        StatusCode::FORBIDDEN => ClientError::Forbidden(body),
        StatusCode::CONFLICT => ClientError::Conflict(body),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
        other => ClientError::Status {
            code: other.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "closed".into()),
            ClientError::Conflict(body) if body == "closed"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new()),
            ClientError::Status { code: 502, .. }
        ));
    }

    #[test]
    fn test_rejects_malformed_base_url() {
        let result = PayloadClient::new(&ClientConfig::new("not a url"));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_paths_join_base_url_once() {
        let client = PayloadClient::new(&ClientConfig::new("http://localhost:3000/api/"));
        let Ok(client) = client else {
            panic!("client should build");
        };
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.url("/polls"), "http://localhost:3000/api/polls");
        assert_eq!(client.url("polls/1"), "http://localhost:3000/api/polls/1");
    }
}
