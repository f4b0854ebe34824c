use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::endpoint::EndpointRole;

/// Default lifetime of a pending authorization attempt.
pub const DEFAULT_ATTEMPT_LIFETIME_SECS: u64 = 600;

/// Registered client credentials. Stored verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Everything needed to configure an [`OidcClient`](crate::OidcClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcSettings {
    #[serde(flatten)]
    pub client: ClientConfig,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    #[serde(default = "default_attempt_lifetime_secs")]
    pub attempt_lifetime_secs: u64,
}

fn default_attempt_lifetime_secs() -> u64 {
    DEFAULT_ATTEMPT_LIFETIME_SECS
}

impl OidcSettings {
    /// Read settings from `OIDC_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Keys: `OIDC_CLIENT_ID`, `OIDC_CLIENT_SECRET`, `OIDC_REDIRECT_URI`,
    /// `OIDC_AUTH_ENDPOINT`, `OIDC_TOKEN_ENDPOINT` and the optional
    /// `OIDC_ATTEMPT_LIFETIME_SECS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let require = |key: &'static str| lookup(key).ok_or(Error::MissingConfig { key });

        let attempt_lifetime_secs = match lookup("OIDC_ATTEMPT_LIFETIME_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| Error::InvalidConfig {
                key: "OIDC_ATTEMPT_LIFETIME_SECS",
                value: raw.clone(),
            })?,
            None => DEFAULT_ATTEMPT_LIFETIME_SECS,
        };

        Ok(Self {
            client: ClientConfig {
                client_id: require("OIDC_CLIENT_ID")?,
                client_secret: require("OIDC_CLIENT_SECRET")?,
                redirect_uri: require("OIDC_REDIRECT_URI")?,
            },
            auth_endpoint: require("OIDC_AUTH_ENDPOINT")?,
            token_endpoint: require("OIDC_TOKEN_ENDPOINT")?,
            attempt_lifetime_secs,
        })
    }

    /// Endpoints in the order they are applied.
    pub fn endpoints(&self) -> [(EndpointRole, &str); 2] {
        [
            (EndpointRole::Auth, self.auth_endpoint.as_str()),
            (EndpointRole::Token, self.token_endpoint.as_str()),
        ]
    }

    pub fn attempt_lifetime(&self) -> Duration {
        Duration::from_secs(self.attempt_lifetime_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const FULL: &[(&str, &str)] = &[
        ("OIDC_CLIENT_ID", "cid"),
        ("OIDC_CLIENT_SECRET", "csecret"),
        ("OIDC_REDIRECT_URI", "https://app/cb"),
        ("OIDC_AUTH_ENDPOINT", "https://idp/authorize"),
        ("OIDC_TOKEN_ENDPOINT", "https://idp/token"),
    ];

    #[test]
    fn from_lookup_reads_all_keys() {
        let settings = OidcSettings::from_lookup(env(FULL)).unwrap();

        assert_eq!(settings.client, ClientConfig::new("cid", "csecret", "https://app/cb"));
        assert_eq!(settings.auth_endpoint, "https://idp/authorize");
        assert_eq!(settings.token_endpoint, "https://idp/token");
        assert_eq!(settings.attempt_lifetime(), Duration::from_secs(600));
    }

    #[test]
    fn from_lookup_reports_missing_key() {
        let err = OidcSettings::from_lookup(env(&FULL[..4])).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfig {
                key: "OIDC_TOKEN_ENDPOINT"
            }
        ));
    }

    #[test]
    fn from_lookup_parses_lifetime() {
        let mut pairs = FULL.to_vec();
        pairs.push(("OIDC_ATTEMPT_LIFETIME_SECS", "120"));
        let settings = OidcSettings::from_lookup(env(&pairs)).unwrap();
        assert_eq!(settings.attempt_lifetime_secs, 120);

        pairs.pop();
        pairs.push(("OIDC_ATTEMPT_LIFETIME_SECS", "ten minutes"));
        match OidcSettings::from_lookup(env(&pairs)).unwrap_err() {
            Error::InvalidConfig { key, value } => {
                assert_eq!(key, "OIDC_ATTEMPT_LIFETIME_SECS");
                assert_eq!(value, "ten minutes");
            }
            other => panic!("Expected InvalidConfig, got: {other:?}"),
        }
    }

    #[test]
    fn deserializes_flat_json() {
        let settings: OidcSettings = serde_json::from_value(serde_json::json!({
            "client_id": "cid",
            "client_secret": "csecret",
            "redirect_uri": "https://app/cb",
            "auth_endpoint": "https://idp/authorize",
            "token_endpoint": "https://idp/token"
        }))
        .unwrap();

        assert_eq!(settings.client.client_id, "cid");
        assert_eq!(settings.attempt_lifetime_secs, DEFAULT_ATTEMPT_LIFETIME_SECS);
        assert_eq!(settings.endpoints()[1], (EndpointRole::Token, "https://idp/token"));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ClientConfig::new("cid", "super-secret", "https://app/cb");
        let printed = format!("{config:?}");
        assert!(printed.contains("cid"));
        assert!(!printed.contains("super-secret"));
    }
}
