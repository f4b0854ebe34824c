use std::time::{Duration, SystemTime};

use serde_json::{Map, Value};

use crate::Error;
use crate::oidc::decode_id_token;

/// Decoded token endpoint reply.
///
/// The body is kept as the provider sent it, including any `error` fields.
/// A body that is not a JSON object decodes to an empty mapping, so an empty
/// response is ambiguous between "no data" and "parse failure".
#[derive(Debug, Clone)]
pub struct TokenResponse {
    data: Map<String, Value>,
    received_at: SystemTime,
}

impl TokenResponse {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            received_at: SystemTime::now(),
        }
    }

    /// Decode a raw token endpoint body. Never fails.
    pub fn from_body(body: &[u8]) -> Self {
        let data = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(
                    body_len = body.len(),
                    "token endpoint body is not a JSON object"
                );
                Map::new()
            }
        };
        Self::new(data)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn token_type(&self) -> Result<&str, Error> {
        self.str_field("token_type")
    }

    pub fn access_token(&self) -> Result<&str, Error> {
        self.str_field("access_token")
    }

    pub fn id_token(&self) -> Result<&str, Error> {
        self.str_field("id_token")
    }

    pub fn has_refresh_token(&self) -> bool {
        self.data.get("refresh_token").is_some_and(Value::is_string)
    }

    pub fn refresh_token(&self) -> Result<&str, Error> {
        self.str_field("refresh_token")
    }

    /// Lifetime of the access token in seconds. Some providers send
    /// `expires_in` as a string, which is accepted too.
    pub fn expires_in(&self) -> Result<u64, Error> {
        match self.data.get("expires_in") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .ok_or(Error::MissingField {
            field: "expires_in",
        })
    }

    /// Absolute expiry. A lifetime too large to represent is treated as invalid.
    pub fn expires_at(&self) -> Result<SystemTime, Error> {
        let expires_in = self.expires_in()?;
        self.received_at
            .checked_add(Duration::from_secs(expires_in))
            .ok_or(Error::MissingField {
                field: "expires_in",
            })
    }

    /// Provider-side error code, when the body carries one.
    pub fn error(&self) -> Option<&str> {
        self.data.get("error").and_then(Value::as_str)
    }

    pub fn error_description(&self) -> Option<&str> {
        self.data.get("error_description").and_then(Value::as_str)
    }

    /// Unverified claims of the returned ID token.
    pub fn id_token_claims(&self) -> Result<Map<String, Value>, Error> {
        decode_id_token(self.id_token()?)
    }

    fn str_field(&self, field: &'static str) -> Result<&str, Error> {
        self.data
            .get(field)
            .and_then(Value::as_str)
            .ok_or(Error::MissingField { field })
    }
}

/// Outcome of a code-for-token exchange.
///
/// Transport failures are data, not errors: callers inspect the variant
/// instead of relying on `?`.
#[derive(Debug, Clone)]
pub enum TokenExchange {
    /// The token endpoint answered. The body may still hold a provider error.
    Received(TokenResponse),
    /// The request never produced a response; holds the transport message.
    Failed(String),
}

impl TokenExchange {
    pub fn tokens(&self) -> Option<&TokenResponse> {
        match self {
            TokenExchange::Received(tokens) => Some(tokens),
            TokenExchange::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            TokenExchange::Received(_) => None,
            TokenExchange::Failed(message) => Some(message),
        }
    }

    pub fn into_result(self) -> Result<TokenResponse, String> {
        match self {
            TokenExchange::Received(tokens) => Ok(tokens),
            TokenExchange::Failed(message) => Err(message),
        }
    }
}
