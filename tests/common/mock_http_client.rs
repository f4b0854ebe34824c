use oidc_authcode::{HttpClient, HttpRequest, HttpResponse};
use std::sync::Mutex;

/// An `HttpClient` implementation that records requests and returns
/// pre-configured outcomes. Used for exercising the client without a
/// network server.
pub struct MockHttpClient {
    /// Pre-configured outcomes to return in order. `Err` simulates a
    /// transport failure with the given message.
    outcomes: Mutex<Vec<Result<HttpResponse, String>>>,
    /// Recorded requests for assertion.
    recorded: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Add a response to the queue. Outcomes are returned in FIFO order.
    pub fn enqueue_response(&self, response: HttpResponse) {
        self.outcomes.lock().unwrap().push(Ok(response));
    }

    pub fn enqueue_json(&self, status: u16, body: serde_json::Value) {
        self.enqueue_response(HttpResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        });
    }

    /// Queue a transport failure.
    pub fn enqueue_failure(&self, message: &str) {
        self.outcomes.lock().unwrap().push(Err(message.to_string()));
    }

    /// Drain and return all recorded requests.
    pub fn take_requests(&self) -> Vec<HttpRequest> {
        self.recorded.lock().unwrap().drain(..).collect()
    }
}

impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.recorded.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .remove(0)
            .map_err(Into::into)
    }
}
