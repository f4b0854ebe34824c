use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock identity provider built on `wiremock`. Serves the token endpoint
/// with configurable behavior.
pub struct MockTokenServer {
    server: MockServer,
}

impl MockTokenServer {
    /// Start a new mock server on a random available port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock server (e.g. "http://127.0.0.1:PORT").
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mount a handler that returns the given JSON body with `status` at
    /// `POST /token` for form-encoded requests.
    pub async fn mock_token_response(&self, status: u16, response: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(status).set_body_json(&response))
            .mount(&self.server)
            .await;
    }

    /// Mount a handler that returns a non-JSON body at `POST /token`.
    pub async fn mock_token_raw(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a handler that answers `POST /token` only after `delay`.
    pub async fn mock_token_delayed(&self, delay: Duration, response: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&response)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
            .len()
    }

    /// Assert that the last request to the mock server contained
    /// the expected form-urlencoded parameters in its body.
    pub async fn verify_token_request(&self, expected_params: &[(&str, &str)]) {
        let requests = self
            .server
            .received_requests()
            .await
            .expect("request recording enabled");
        let last = requests.last().expect("expected at least one request");
        let body_str = String::from_utf8(last.body.clone()).expect("body should be UTF-8");
        let parsed: Vec<(String, String)> = url::form_urlencoded::parse(body_str.as_bytes())
            .into_owned()
            .collect();

        for (key, value) in expected_params {
            let found = parsed.iter().any(|(k, v)| k == key && v == value);
            assert!(
                found,
                "expected form param {}={} in request body, got: {}",
                key, value, body_str
            );
        }
    }
}
