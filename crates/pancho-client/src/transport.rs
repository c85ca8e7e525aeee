use std::time::Duration;

use pancho_core::ClientConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::{ClientError, Result};

const SESSION_HEADER: &str = "x-session-id";

/// Everything but the RFC 3986 unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one path segment, so `/`, `?` and `#` inside it stay data.
/// Dot segments are rejected because URL parsing resolves them even when
/// encoded.
pub fn path_segment(segment: &str) -> Result<String> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(ClientError::InvalidActionId(segment.to_string()));
    }
    Ok(utf8_percent_encode(segment, SEGMENT).to_string())
}

// ─── Transport ────────────────────────────────────────────────────────────

/// JSON-over-HTTP access to the action service.
///
/// One attempt per call. The body is parsed before the status is inspected,
/// so a non-JSON error page surfaces as [`ClientError::Parse`] rather than
/// [`ClientError::Service`].
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    session_id: Option<String>,
    timeout: Duration,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("pancho/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ClientError::Transport {
                method: "BUILD".into(),
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_id: config.session_id.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(session) = &self.session_id {
            req = req.header(SESSION_HEADER, session);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let transport_err = |source| ClientError::Transport {
            method: method.to_string(),
            url: url.clone(),
            source,
        };
        let resp = req.send().await.map_err(transport_err)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport_err)?;
        debug!(%method, path, status = status.as_u16(), "action service responded");

        let data: Value = serde_json::from_str(&text).map_err(|source| ClientError::Parse {
            url: url.clone(),
            status_code: status.as_u16(),
            source,
        })?;

        if !status.is_success() {
            return Err(ClientError::Service {
                status_code: status.as_u16(),
                detail: service_detail(&data),
            });
        }
        Ok(data)
    }
}

/// The human-readable reason carried by an error body.
fn service_detail(data: &Value) -> String {
    match data.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => data.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn transport(url: &str) -> Transport {
        let mut cfg = ClientConfig::with_base_url(url);
        cfg.session_id = Some("web-session".into());
        Transport::new(&cfg).unwrap()
    }

    #[test]
    fn path_segment_encodes_reserved_characters() {
        assert_eq!(path_segment("t-1").unwrap(), "t-1");
        assert_eq!(path_segment("a?x=1#f").unwrap(), "a%3Fx%3D1%23f");
        assert_eq!(path_segment("../b").unwrap(), "..%2Fb");
        assert_eq!(path_segment("café").unwrap(), "caf%C3%A9");
        assert!(matches!(path_segment(".."), Err(ClientError::InvalidActionId(_))));
    }

    #[tokio::test]
    async fn post_sends_json_and_session_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/agent/plan")
            .match_header("x-session-id", "web-session")
            .match_header("content-type", "application/json")
            .match_header("user-agent", Matcher::Regex("^pancho/".into()))
            .match_body(Matcher::Json(json!({"goal": "post a note"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"plan_summary":"ok","actions":[]}"#)
            .create_async()
            .await;

        let data = transport(&server.url())
            .post_json("/agent/plan", &json!({"goal": "post a note"}))
            .await
            .unwrap();
        assert_eq!(data["plan_summary"], "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_uses_detail_string() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/actions/execute")
            .with_status(409)
            .with_body(r#"{"detail":"not approved"}"#)
            .create_async()
            .await;

        let err = transport(&server.url())
            .post_json("/actions/execute", &json!({"action_id": "x"}))
            .await
            .unwrap_err();
        match err {
            ClientError::Service { status_code, detail } => {
                assert_eq!(status_code, 409);
                assert_eq!(detail, "not approved");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_without_detail_serializes_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/actions/gone")
            .with_status(404)
            .with_body(r#"{"error":"missing"}"#)
            .create_async()
            .await;

        let err = transport(&server.url())
            .get_json("/actions/gone")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.detail(), Some(r#"{"error":"missing"}"#));
    }

    #[tokio::test]
    async fn structured_detail_is_serialized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/actions/propose")
            .with_status(422)
            .with_body(r#"{"detail":[{"loc":["body","pubkey"],"msg":"field required"}]}"#)
            .create_async()
            .await;

        let err = transport(&server.url())
            .post_json("/actions/propose", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err.detail(),
            Some(r#"[{"loc":["body","pubkey"],"msg":"field required"}]"#)
        );
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error_even_on_failure_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/actions/a")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let err = transport(&server.url()).get_json("/actions/a").await.unwrap_err();
        assert!(matches!(err, ClientError::Parse { status_code: 502, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let cfg = ClientConfig::with_base_url("http://127.0.0.1:9");
        let err = Transport::new(&cfg)
            .unwrap()
            .get_json("/actions/a")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let t = transport("http://localhost:8787/");
        assert_eq!(t.base_url(), "http://localhost:8787");
    }
}
