use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header;

use crate::{
    error::EtlError,
    types::{ClientCredentials, TokenResponse},
};

use super::SpotifyClient;

/// Builds the `Authorization` header value for the client-credentials grant.
///
/// # Example
///
/// ```
/// assert_eq!(basic_auth_header("id", "secret"), "Basic aWQ6c2VjcmV0");
/// ```
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{client_id}:{client_secret}"));
    format!("Basic {encoded}")
}

/// Interprets a token endpoint response.
///
/// # Returns
///
/// - `Ok(String)` - the bearer token
/// - `Err(EtlError::Auth)` - non-2xx status, with the response body attached
/// - `Err(EtlError::Protocol)` - 2xx but no usable `access_token`
pub fn token_from_response(status: u16, body: &str) -> Result<String, EtlError> {
    if !(200..300).contains(&status) {
        return Err(EtlError::Auth {
            status,
            body: body.to_string(),
        });
    }

    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| EtlError::Protocol(format!("token response is not valid JSON: {e}")))?;

    parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EtlError::Protocol("no access_token in token response".to_string()))
}

impl SpotifyClient {
    /// Exchanges client credentials for an access token.
    ///
    /// Posts `grant_type=client_credentials` to the token endpoint with HTTP
    /// Basic authentication. There is no retry and no caching: a run asks for
    /// exactly one token.
    ///
    /// # Arguments
    ///
    /// * `credentials` - non-empty client id and secret
    ///
    /// # Errors
    ///
    /// - [`EtlError::Transport`] when the endpoint cannot be reached or times out
    /// - [`EtlError::Auth`] when Spotify rejects the credentials
    /// - [`EtlError::Protocol`] when the response carries no token
    pub fn request_token(&self, credentials: &ClientCredentials) -> Result<String, EtlError> {
        let response = self
            .http
            .post(self.token_url.clone())
            .header(
                header::AUTHORIZATION,
                basic_auth_header(&credentials.client_id, &credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;

        let token = token_from_response(status, &body)?;
        tracing::info!("obtained spotify access token");
        Ok(token)
    }
}
