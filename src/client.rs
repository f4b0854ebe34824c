use std::time::{Duration, SystemTime};

use url::Url;

use crate::config::{ClientConfig, DEFAULT_ATTEMPT_LIFETIME_SECS, OidcSettings};
use crate::endpoint::{AbsoluteUrlValidator, EndpointRole, EndpointSet, UrlValidator};
use crate::error::Error;
use crate::http::HttpClient;
use crate::oidc::verify_nonce;
use crate::redirect::Redirector;
use crate::request::{create_token_request, send_token_request};
use crate::state::{AuthorizationAttempt, StateStore, generate_nonce};
use crate::tokens::TokenExchange;

/// Scopes requested on every authorization.
pub const SCOPE: &str = "openid profile email";

/// Resource server the requested access token is scoped to.
pub const RESOURCE: &str = "https://graph.windows.net";

/// Parameters of one authorization request, with the attempt already
/// persisted.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub nonce: String,
    params: Vec<(&'static str, String)>,
}

impl AuthorizationRequest {
    /// Query parameters in the order they are sent.
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Append the parameters to `endpoint`, keeping any query it already has.
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut().extend_pairs(&self.params);
        url
    }
}

/// OpenID Connect authorization-code client.
///
/// Holds the client credentials and provider endpoints, records every
/// authorization attempt in a [`StateStore`] and exchanges codes for tokens
/// through an [`HttpClient`]. One instance serves one request; isolation
/// between concurrent attempts is the store's job.
pub struct OidcClient<H, S, V = AbsoluteUrlValidator> {
    http_client: H,
    state_store: S,
    validator: V,
    credentials: Option<ClientConfig>,
    endpoints: EndpointSet,
    attempt_lifetime: Duration,
}

impl<H, S> OidcClient<H, S>
where
    H: HttpClient,
    S: StateStore,
{
    pub fn new(http_client: H, state_store: S) -> Self {
        Self::with_validator(http_client, state_store, AbsoluteUrlValidator)
    }
}

impl<H, S, V> OidcClient<H, S, V>
where
    H: HttpClient,
    S: StateStore,
    V: UrlValidator,
{
    pub fn with_validator(http_client: H, state_store: S, validator: V) -> Self {
        Self {
            http_client,
            state_store,
            validator,
            credentials: None,
            endpoints: EndpointSet::new(),
            attempt_lifetime: Duration::from_secs(DEFAULT_ATTEMPT_LIFETIME_SECS),
        }
    }

    /// Apply credentials, endpoints and attempt lifetime from `settings`.
    ///
    /// Endpoints go through [`OidcClient::set_endpoints`], so an invalid
    /// token endpoint leaves the auth endpoint applied.
    pub fn configure(&mut self, settings: &OidcSettings) -> Result<(), Error> {
        let ClientConfig {
            client_id,
            client_secret,
            redirect_uri,
        } = settings.client.clone();
        self.set_credentials(client_id, client_secret, redirect_uri);
        self.attempt_lifetime = settings.attempt_lifetime();
        self.set_endpoints(settings.endpoints())
    }

    pub fn with_attempt_lifetime(mut self, lifetime: Duration) -> Self {
        self.attempt_lifetime = lifetime;
        self
    }

    pub fn http_client(&self) -> &H {
        &self.http_client
    }

    pub fn state_store(&self) -> &S {
        &self.state_store
    }

    /// Store the registered client id, secret and redirect URI verbatim.
    pub fn set_credentials(
        &mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) {
        self.credentials = Some(ClientConfig::new(client_id, client_secret, redirect_uri));
    }

    pub fn client_id(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.client_id.as_str())
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.client_secret.as_str())
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.redirect_uri.as_str())
    }

    /// Validate and store endpoints in iteration order.
    ///
    /// Fails with [`Error::InvalidEndpoint`] on the first bad URI; entries
    /// before it in the same call remain applied.
    pub fn set_endpoints<I, U>(&mut self, endpoints: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (EndpointRole, U)>,
        U: AsRef<str>,
    {
        let result = self
            .endpoints
            .extend_validated(endpoints, &self.validator);
        if let Err(Error::InvalidEndpoint { role, uri }) = &result {
            tracing::warn!(%role, %uri, "rejected invalid endpoint URI");
        }
        result
    }

    pub fn endpoint(&self, role: EndpointRole) -> Option<&Url> {
        self.endpoints.get(role)
    }

    /// Mint and persist a new attempt for `session`, returning the full
    /// authorization-code request parameters.
    ///
    /// `prompt=login` forces the provider to re-authenticate the user on
    /// every attempt instead of reusing its own session.
    pub async fn build_authorization_request(
        &self,
        session: &str,
    ) -> Result<AuthorizationRequest, Error> {
        let client_id = self.require_client_id()?;

        let nonce = generate_nonce();
        let attempt = AuthorizationAttempt::new(session, nonce.clone());
        let state = attempt.state.clone();

        self.state_store
            .insert(attempt)
            .await
            .map_err(Error::StateStore)?;
        tracing::info!(session, "recorded authorization attempt");

        let params = vec![
            ("response_type", "code".to_string()),
            ("client_id", client_id.to_string()),
            ("scope", SCOPE.to_string()),
            ("nonce", nonce.clone()),
            ("response_mode", "form_post".to_string()),
            ("resource", RESOURCE.to_string()),
            ("state", state.clone()),
            ("prompt", "login".to_string()),
        ];

        Ok(AuthorizationRequest {
            state,
            nonce,
            params,
        })
    }

    /// Start an authorization: persist a new attempt for `session` and
    /// redirect to the authorization endpoint.
    ///
    /// Returns the redirector's terminal response; the current request ends
    /// with it.
    pub async fn begin_authorization<R>(
        &self,
        session: &str,
        redirector: &R,
    ) -> Result<R::Response, Error>
    where
        R: Redirector + ?Sized,
    {
        self.require_client_id()?;
        let auth_endpoint = self.endpoints.require(EndpointRole::Auth)?;

        let request = self.build_authorization_request(session).await?;
        let location = request.to_url(auth_endpoint);
        tracing::debug!(endpoint = %auth_endpoint, "redirecting to authorization endpoint");

        Ok(redirector.redirect_to(location))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Only a missing token endpoint is an `Err`. A transport failure comes
    /// back as [`TokenExchange::Failed`] and a provider error as a decoded
    /// body carrying `error`. Nothing is retried.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenExchange, Error> {
        let token_endpoint = self.endpoints.require(EndpointRole::Token)?;

        let mut body = Vec::with_capacity(5);
        if let Some(credentials) = &self.credentials {
            body.push(("client_id", credentials.client_id.as_str()));
            body.push(("client_secret", credentials.client_secret.as_str()));
        }
        body.push(("grant_type", "authorization_code"));
        body.push(("code", code));
        if let Some(credentials) = &self.credentials {
            body.push(("redirect_uri", credentials.redirect_uri.as_str()));
        }

        let request = create_token_request(token_endpoint.as_str(), &body);
        tracing::debug!(endpoint = %token_endpoint, "exchanging authorization code");

        Ok(send_token_request(&self.http_client, request).await)
    }

    /// Consume the pending attempt for `state`. The attempt is removed from
    /// the store before any check, so it cannot be replayed.
    pub async fn consume_authorization(
        &self,
        state: &str,
        session: &str,
    ) -> Result<AuthorizationAttempt, Error> {
        let attempt = self
            .state_store
            .take(state)
            .await
            .map_err(Error::StateStore)?
            .ok_or_else(|| {
                tracing::warn!("callback state has no pending attempt");
                Error::UnknownState
            })?;

        if attempt.is_expired_at(self.attempt_lifetime, SystemTime::now()) {
            tracing::warn!(session = %attempt.session, "authorization attempt expired");
            return Err(Error::ExpiredState);
        }
        if attempt.session != session {
            tracing::warn!(
                expected = %attempt.session,
                actual = session,
                "authorization attempt used from another session"
            );
            return Err(Error::SessionMismatch);
        }

        tracing::info!(session, "consumed authorization attempt");
        Ok(attempt)
    }

    /// Handle the provider's callback: consume the attempt for `state`,
    /// exchange `code`, and check the ID token nonce when one is returned.
    ///
    /// Soft transport failures are returned unchanged.
    pub async fn complete_authorization(
        &self,
        state: &str,
        session: &str,
        code: &str,
    ) -> Result<(AuthorizationAttempt, TokenExchange), Error> {
        let attempt = self.consume_authorization(state, session).await?;
        let exchange = self.exchange_code_for_token(code).await?;

        if let Some(id_token) = exchange.tokens().and_then(|t| t.id_token().ok()) {
            verify_nonce(id_token, &attempt.nonce)?;
        }

        Ok((attempt, exchange))
    }

    /// Delete attempts older than `max_age`. Returns how many were removed.
    pub async fn prune_stale_attempts(&self, max_age: Duration) -> Result<usize, Error> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let removed = self
            .state_store
            .prune(cutoff)
            .await
            .map_err(Error::StateStore)?;
        tracing::info!(removed, "pruned stale authorization attempts");
        Ok(removed)
    }

    fn require_client_id(&self) -> Result<&str, Error> {
        self.client_id()
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingCredentials)
    }
}
