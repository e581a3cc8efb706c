// Authentication endpoints
//
// Web3 login exchanges a signed token for either a nonce (wallet not yet
// registered) or a session cookie. The cookie lands in the client's jar,
// so subsequent requests are authenticated without further work here.

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::RestClient;
use crate::error::Error;
use crate::models::{CurrentUserResponse, NonceOrAuthorizeResponse};

impl RestClient {
    /// Exchange a wallet-signed token for a nonce or a session.
    ///
    /// `POST /authentication/nonceOrAuthorize` with `Authorization: Web3 <token>`
    pub async fn nonce_or_authorize(
        &self,
        signed_web3_token: &SecretString,
    ) -> Result<NonceOrAuthorizeResponse, Error> {
        debug!("authorizing web3 token");
        let builder = self
            .request(Method::POST, "/authentication/nonceOrAuthorize")?
            .header(
                AUTHORIZATION,
                format!("Web3 {}", signed_web3_token.expose_secret()),
            );
        let resp: Option<NonceOrAuthorizeResponse> = self.send_json(builder).await?;
        Ok(resp.unwrap_or_default())
    }

    /// The authenticated user.
    ///
    /// `GET /users/current`
    pub async fn fetch_current_user(&self) -> Result<CurrentUserResponse, Error> {
        debug!("fetching current user");
        self.get("/users/current", None).await
    }

    /// End the server-side session.
    ///
    /// `DELETE /authentication/session`
    pub async fn clear_session(&self) -> Result<u16, Error> {
        debug!("clearing session");
        self.delete_status("/authentication/session", None::<&()>)
            .await
    }
}
