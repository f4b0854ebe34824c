use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Role an endpoint plays in the authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// Authorization endpoint the resource owner is redirected to.
    Auth,
    /// Token endpoint used for the back-channel code exchange.
    Token,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Auth => "auth",
            EndpointRole::Token => "token",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that an endpoint string is a well-formed absolute URL.
pub trait UrlValidator: Send + Sync {
    /// Returns the parsed URL, or `None` when `uri` is rejected.
    fn validate(&self, uri: &str) -> Option<Url>;
}

/// Accepts absolute `http`/`https` URLs with a host whose serialization
/// is exactly the input, so the stored endpoint reads back as supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteUrlValidator;

impl UrlValidator for AbsoluteUrlValidator {
    fn validate(&self, uri: &str) -> Option<Url> {
        let url = Url::parse(uri).ok()?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }

        (url.as_str() == uri).then_some(url)
    }
}

/// Provider endpoints keyed by role. Only validated URLs are stored.
#[derive(Debug, Clone, Default)]
pub struct EndpointSet {
    endpoints: HashMap<EndpointRole, Url>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store each entry in iteration order, overwriting any
    /// previous URL for the same role.
    ///
    /// Stops at the first invalid URI. Entries before it stay applied, so a
    /// caller that needs all-or-nothing semantics must re-set the full map.
    pub fn extend_validated<I, S>(
        &mut self,
        entries: I,
        validator: &(impl UrlValidator + ?Sized),
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = (EndpointRole, S)>,
        S: AsRef<str>,
    {
        for (role, uri) in entries {
            let uri = uri.as_ref();
            let url = validator
                .validate(uri)
                .ok_or_else(|| Error::InvalidEndpoint {
                    role,
                    uri: uri.to_string(),
                })?;
            self.endpoints.insert(role, url);
        }
        Ok(())
    }

    pub fn get(&self, role: EndpointRole) -> Option<&Url> {
        self.endpoints.get(&role)
    }

    /// Like [`EndpointSet::get`] but fails with [`Error::MissingEndpoint`].
    pub fn require(&self, role: EndpointRole) -> Result<&Url, Error> {
        self.get(role).ok_or(Error::MissingEndpoint { role })
    }
}
