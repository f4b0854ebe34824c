use url::Url;

/// Sends the resource owner's user agent to an external location.
///
/// The returned value is the terminal response of the current request:
/// the host framework sends it and nothing runs after it.
pub trait Redirector {
    type Response;

    fn redirect_to(&self, location: Url) -> Self::Response;
}

impl<F, R> Redirector for F
where
    F: Fn(Url) -> R,
{
    type Response = R;

    fn redirect_to(&self, location: Url) -> R {
        self(location)
    }
}
