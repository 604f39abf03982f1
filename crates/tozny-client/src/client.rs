use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::api::account::AccountSession;
use crate::credentials::ClientCredentials;
use crate::error::{ClientError, Result};

pub const DEFAULT_API_ENDPOINT: &str = "https://api.e3db.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which bearer token a request is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    /// Token exchanged for the client API key.
    Client,
    /// Token from an account username/password login.
    Account,
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticated handle to the account and identity APIs.
///
/// Tokens are fetched lazily on first use and reused until the API rejects
/// one with 401, at which point it is dropped and fetched again once.
pub struct ToznyClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: ClientCredentials,
    client_token: RwLock<Option<String>>,
    account_session: RwLock<Option<AccountSession>>,
}

impl std::fmt::Debug for ToznyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToznyClient")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.credentials.client_id)
            .finish()
    }
}

impl ToznyClient {
    /// Build a client from credentials; `credentials.api_url` selects the endpoint.
    pub fn new(credentials: ClientCredentials) -> Result<Self> {
        let endpoint = if credentials.api_url.is_empty() {
            DEFAULT_API_ENDPOINT.to_string()
        } else {
            credentials.api_url.clone()
        };
        let base_url = parse_endpoint(&endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tozny-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            client_token: RwLock::new(None),
            account_session: RwLock::new(None),
        })
    }

    /// Client without credentials, for account creation and login.
    pub fn anonymous(endpoint: &str) -> Result<Self> {
        Self::new(ClientCredentials {
            api_url: endpoint.to_string(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn client_token(&self) -> Result<String> {
        if let Some(token) = self.client_token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut cached = self.client_token.write().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        if !self.credentials.has_api_key() {
            return Err(ClientError::missing_credentials(
                "client API key and secret are required",
            ));
        }
        let url = self.url(&["v1", "auth", "token"]);
        tracing::debug!(client_id = %self.credentials.client_id, "requesting client token");
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.credentials.api_key_id, Some(&self.credentials.api_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body(&[("grant_type", "client_credentials")]))
            .send()
            .await?;
        let body = read_body(resp).await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        *cached = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    /// Account session for the configured account username and password.
    pub async fn account_session(&self) -> Result<AccountSession> {
        if let Some(session) = self.account_session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut cached = self.account_session.write().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }
        if !self.credentials.has_account_login() {
            return Err(ClientError::missing_credentials(
                "account username and password are required",
            ));
        }
        let session = self
            .login(
                &self.credentials.account_username,
                &self.credentials.account_password,
            )
            .await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Drop the cached token for `auth` so the next request fetches a new one.
    async fn invalidate(&self, auth: Auth) {
        match auth {
            Auth::Client => *self.client_token.write().await = None,
            Auth::Account => *self.account_session.write().await = None,
        }
    }

    fn build(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let url = self.url(segments);
        tracing::debug!(%method, path = url.path(), "tozny request");
        self.http
            .request(method, url)
            .header(ACCEPT, "application/json")
    }

    async fn dispatch(req: reqwest::RequestBuilder, body: Option<Value>) -> Result<String> {
        let req = match body {
            Some(body) => req.json(&body),
            None => req,
        };
        let resp = req.send().await?;
        read_body(resp).await
    }

    async fn execute(
        &self,
        auth: Auth,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<String> {
        match self.authorized(auth, method.clone(), segments, body.clone()).await {
            Err(ClientError::Api { status: 401, .. }) => {
                tracing::debug!(?auth, "token rejected, fetching a new one");
                self.invalidate(auth).await;
                self.authorized(auth, method, segments, body).await
            }
            other => other,
        }
    }

    async fn authorized(
        &self,
        auth: Auth,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<String> {
        let token = match auth {
            Auth::Client => self.client_token().await?,
            Auth::Account => self.account_session().await?.token,
        };
        let req = self.build(method, segments).bearer_auth(token);
        Self::dispatch(req, body).await
    }

    /// Unauthenticated call, used for account creation and login.
    pub(crate) async fn call_anonymous<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T> {
        let body = body.map(serde_json::to_value).transpose()?;
        let text = Self::dispatch(self.build(method, segments), body).await?;
        decode(&text)
    }

    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        auth: Auth,
        method: Method,
        segments: &[&str],
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T> {
        let body = body.map(serde_json::to_value).transpose()?;
        let text = self.execute(auth, method, segments, body).await?;
        decode(&text)
    }

    /// Like [`Self::call`] for endpoints whose response body is ignored.
    pub(crate) async fn call_unit(
        &self,
        auth: Auth,
        method: Method,
        segments: &[&str],
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<()> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.execute(auth, method, segments, body).await?;
        Ok(())
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.call(Auth::Client, Method::GET, segments, None::<&Value>)
            .await
    }

    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.call_unit(Auth::Client, Method::DELETE, segments, None::<&Value>)
            .await
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| ClientError::invalid_endpoint(endpoint, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::invalid_endpoint(
            endpoint,
            "scheme must be http or https",
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ClientError::invalid_endpoint(endpoint, "not a base URL"));
    }
    Ok(url)
}

async fn read_body(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if status.is_success() {
        return Ok(body);
    }
    let message = error_message(&body);
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(message));
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull a human readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "error"] {
            match json.get(key) {
                Some(Value::String(msg)) if !msg.is_empty() => return msg.clone(),
                Some(Value::Object(obj)) => {
                    if let Some(Value::String(msg)) = obj.get("message") {
                        return msg.clone();
                    }
                }
                _ => {}
            }
        }
    }
    if body.is_empty() {
        "empty response body".to_string()
    } else {
        body.to_string()
    }
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"realm exists"}"#), "realm exists");
        assert_eq!(
            error_message(r#"{"error":{"message":"bad group"}}"#),
            "bad group"
        );
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(""), "empty response body");
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(parse_endpoint("https://api.e3db.com").is_ok());
        assert!(parse_endpoint("ftp://api.e3db.com").is_err());
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let client = ToznyClient::anonymous("http://localhost:8000/").unwrap();
        let url = client.url(&["v1", "identity", "realm", "my realm"]);
        assert_eq!(url.as_str(), "http://localhost:8000/v1/identity/realm/my%20realm");
    }

    #[test]
    fn test_default_endpoint() {
        let client = ToznyClient::new(ClientCredentials::default()).unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_ENDPOINT);
    }

    #[test]
    fn test_decode_empty_body_as_unit_or_option() {
        let unit: () = decode("").unwrap();
        assert_eq!(unit, ());
        let none: Option<String> = decode("  ").unwrap();
        assert!(none.is_none());
    }
}
