use crate::endpoint::EndpointRole;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No client id was configured before starting an authorization.
    #[error("Client credentials are not set")]
    MissingCredentials,

    /// The endpoint needed by the operation was never set.
    #[error("No {role} endpoint set")]
    MissingEndpoint { role: EndpointRole },

    /// An endpoint URI failed validation. Entries applied earlier in the
    /// same call are kept.
    #[error("Invalid endpoint URI for {role}: {uri}")]
    InvalidEndpoint { role: EndpointRole, uri: String },

    /// The state store backing pending authorization attempts failed.
    #[error("State store failure: {0}")]
    StateStore(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The callback state has no pending attempt: never issued or already consumed.
    #[error("Unknown or already consumed state")]
    UnknownState,

    #[error("Authorization attempt has expired")]
    ExpiredState,

    #[error("Authorization attempt belongs to another session")]
    SessionMismatch,

    /// The `nonce` claim of the returned ID token differs from the one
    /// recorded with the attempt.
    #[error("ID token nonce does not match the authorization attempt")]
    NonceMismatch,

    /// A required field is missing from the token response or ID token.
    #[error("Missing or invalid field: {field}")]
    MissingField { field: &'static str },

    #[error("Missing configuration value: {key}")]
    MissingConfig { key: &'static str },

    /// A configuration value is present but cannot be parsed.
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },
}
