use std::future::Future;

/// A minimal HTTP request representation (method is always POST for the
/// token endpoint).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A minimal HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for the token endpoint. Each `send` issues exactly one POST and
/// reports its outcome; implementations must not retry on their own.
///
/// Timeouts and cancellation belong to the implementation. `Send + Sync` is
/// required so one client can be shared across async tasks.
pub trait HttpClient: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>>> + Send;
}

#[cfg(feature = "reqwest-client")]
mod reqwest_impl {
    use std::time::Duration;

    use super::{HttpClient, HttpRequest, HttpResponse};

    pub struct ReqwestClient {
        inner: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Self {
            Self {
                inner: reqwest::Client::new(),
            }
        }

        /// Build a client whose requests fail after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
            let inner = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self { inner })
        }
    }

    impl Default for ReqwestClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HttpClient for ReqwestClient {
        async fn send(
            &self,
            req: HttpRequest,
        ) -> Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>> {
            let mut builder = self.inner.post(&req.url);

            for (name, value) in &req.headers {
                builder = builder.header(name, value);
            }

            builder = builder.body(req.body);

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();

            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(feature = "reqwest-client")]
pub use reqwest_impl::ReqwestClient;
