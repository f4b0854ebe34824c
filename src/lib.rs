mod client;
mod config;
mod endpoint;
mod error;
mod http;
mod oidc;
mod redirect;
mod request;
mod state;
mod tokens;

// Core
pub use client::{AuthorizationRequest, OidcClient, RESOURCE, SCOPE};
pub use error::Error;
pub use tokens::{TokenExchange, TokenResponse};

// Collaborators
pub use endpoint::{AbsoluteUrlValidator, EndpointRole, EndpointSet, UrlValidator};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use redirect::Redirector;
pub use state::{AuthorizationAttempt, InMemoryStateStore, StateStore};

// Configuration
pub use config::{ClientConfig, DEFAULT_ATTEMPT_LIFETIME_SECS, OidcSettings};

// Utilities
pub use oidc::{decode_id_token, verify_nonce};
pub use state::{NONCE_PREFIX, generate_nonce, generate_state};

// Default HTTP client (behind feature flag)
#[cfg(feature = "reqwest-client")]
pub use http::ReqwestClient;
