use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

pub type Headers = Vec<(String, String)>;

pub fn header(key: &str, value: impl Into<String>) -> (String, String) {
    (String::from(key), value.into())
}

/// One authenticated GET returning a parsed JSON document.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str, headers: &Headers) -> Result<Value>;
}

#[derive(Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn send_request(
        &self,
        url: &str,
        headers: &Headers,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.client.get(url);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.send().await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, headers: &Headers) -> Result<Value> {
        tracing::debug!(url, "GET");
        let response = self.send_request(url, headers).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        handle_status(url, status, body)
    }
}

/// 401/403 are auth failures, anything from 200 to 399 must carry JSON,
/// every other status is an error.
pub fn handle_status(url: &str, status: u16, body: String) -> Result<Value> {
    match status {
        401 | 403 => Err(Error::Auth { status, body }),
        200..=399 => serde_json::from_str(&body).map_err(|source| {
            tracing::debug!(url, body = %body, "error parsing response");
            Error::Malformed {
                url: url.to_string(),
                body,
                source,
            }
        }),
        _ => Err(Error::Status {
            url: url.to_string(),
            status,
        }),
    }
}

/// Fetches `url` and decodes it into the service-specific response type.
pub async fn request<T: serde::de::DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
    headers: &Headers,
) -> Result<T> {
    let value = transport.get_json(url, headers).await?;
    T::deserialize(&value).map_err(|source| Error::Malformed {
        url: url.to_string(),
        body: value.to_string(),
        source,
    })
}


#[cfg(test)]
mod transport_tests {
    use super::*;

    #[test]
    fn auth_failure_carries_status_and_body() {
        let err = handle_status("http://ci", 403, String::from("forbidden")).unwrap_err();
        assert!(matches!(err, Error::Auth { status: 403, .. }));
        assert_eq!(err.to_string(), "Invalid API token (403 forbidden)");
    }

    #[test]
    fn unparsable_body_on_success() {
        let err = handle_status("http://ci", 200, String::from("<html>")).unwrap_err();
        match err {
            Error::Malformed { url, body, .. } => {
                assert_eq!(url, "http://ci");
                assert_eq!(body, "<html>");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn redirect_range_is_accepted() {
        let value = handle_status("http://ci", 304, String::from("{\"a\":1}")).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn other_status_is_an_error() {
        let err = handle_status("http://ci/x", 500, String::from("boom")).unwrap_err();
        assert_eq!(err.to_string(), "Error getting URL http://ci/x: 500");
    }

    #[derive(Debug, serde::Deserialize)]
    struct Shape {
        #[allow(dead_code)]
        name: String,
    }

    #[tokio::test]
    async fn request_reports_shape_mismatch_as_malformed() {
        let transport =
            fake::FakeTransport::new().with_json("http://ci", serde_json::json!({"other": 1}));
        let err = request::<Shape>(&transport, "http://ci", &vec![])
            .await
            .unwrap_err();
        match err {
            Error::Malformed { body, .. } => assert_eq!(body, "{\"other\":1}"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
