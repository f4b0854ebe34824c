use crate::http::{HttpClient, HttpRequest};
use crate::tokens::{TokenExchange, TokenResponse};

/// Build a form-encoded POST request for the token endpoint.
/// Sets Content-Type, Accept: application/json, User-Agent: oidc-authcode.
pub fn create_token_request(endpoint: &str, body: &[(&str, &str)]) -> HttpRequest {
    let encoded_body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(body)
        .finish();

    HttpRequest {
        url: endpoint.to_string(),
        headers: vec![
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), "oidc-authcode".to_string()),
        ],
        body: encoded_body.into_bytes(),
    }
}

/// Send a token request once and decode whatever comes back.
/// - transport failure -> `TokenExchange::Failed(message)`
/// - any HTTP status   -> `TokenExchange::Received(..)` with the decoded body,
///   provider error fields included
pub async fn send_token_request(
    client: &(impl HttpClient + ?Sized),
    request: HttpRequest,
) -> TokenExchange {
    let endpoint = request.url.clone();

    match client.send(request).await {
        Ok(response) => {
            if !response.is_success() {
                tracing::warn!(
                    %endpoint,
                    status = response.status,
                    "token endpoint returned a non-success status"
                );
            }
            TokenExchange::Received(TokenResponse::from_body(&response.body))
        }
        Err(err) => {
            tracing::warn!(%endpoint, error = %err, "token request failed");
            TokenExchange::Failed(err.to_string())
        }
    }
}
