// API client module: a small blocking HTTP session against the v1.1
// endpoint family. It holds the default headers that carry auth once
// `login` has run, and implements `AuthenticatedPost` so the banner
// extension can be layered on top.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::banner::{ApiResponse, AuthenticatedPost};
use crate::config::{Config, Credentials};
use crate::followers::{FollowerPage, UserRecord};

pub const LOGIN_PATH: &str = "/1.1/account/login.json";
pub const USERS_SHOW_PATH: &str = "/1.1/users/show.json";
pub const FOLLOWERS_LIST_PATH: &str = "/1.1/followers/list.json";
pub const UPDATE_PROFILE_IMAGE_PATH: &str = "/1.1/account/update_profile_image.json";

/// Page size requested from the follower listing.
const FOLLOWERS_PAGE_SIZE: u32 = 20;

/// Authenticated session. Created once per run and dropped at exit.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    base_headers: HeaderMap,
}

/// Login request payload.
#[derive(Serialize, Debug)]
pub struct LoginRequest {
    pub auth_info_1: String,
    pub auth_info_2: String,
    pub password: String,
}

/// Tokens handed back by a successful login.
#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    pub auth_token: String,
    #[serde(default)]
    pub ct0: Option<String>,
}

impl ApiClient {
    /// Create an unauthenticated session against `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        let mut base_headers = HeaderMap::new();
        base_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        base_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_headers,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url)
    }

    /// Returns whether `login` has stored an auth header.
    pub fn is_authenticated(&self) -> bool {
        self.base_headers.contains_key(AUTHORIZATION)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange the three credential strings for session tokens and keep
    /// them in the default headers.
    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let req = LoginRequest {
            auth_info_1: credentials.auth_info_1.clone(),
            auth_info_2: credentials.auth_info_2.clone(),
            password: credentials.password.clone(),
        };
        let url = self.url(LOGIN_PATH);
        debug!("Sending login request to {}", url);

        let res = self
            .client
            .post(&url)
            .headers(self.base_headers.clone())
            .form(&req)
            .send()
            .context("Failed to send login request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Login failed: {} - {}", status, txt);
        }
        let resp: LoginResponse = res.json().context("Parsing login response json")?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", resp.auth_token))
            .context("Login returned an unusable auth token")?;
        self.base_headers.insert(AUTHORIZATION, bearer);
        if let Some(ct0) = resp.ct0.as_deref() {
            let csrf = HeaderValue::from_str(ct0).context("Login returned an unusable csrf token")?;
            self.base_headers.insert("x-csrf-token", csrf);
        }
        info!("Logged in as {}", credentials.auth_info_1);
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!("Sending GET request to {}", url);
        let res = self
            .client
            .get(&url)
            .headers(self.base_headers.clone())
            .query(query)
            .send()
            .with_context(|| format!("Failed to send request to {}", path))?;
        let res = check_status(res, path)?;
        res.json()
            .with_context(|| format!("Parsing {} response json", path))
    }

    /// Resolve a handle to the user record, which carries the numeric id.
    pub fn get_user_by_screen_name(&self, screen_name: &str) -> Result<UserRecord> {
        self.get_json(USERS_SHOW_PATH, &[("screen_name", screen_name.to_string())])
    }

    /// First page of followers of the account with numeric id `user_id`.
    pub fn get_user_followers(&self, user_id: &str) -> Result<Vec<UserRecord>> {
        let page: FollowerPage = self.get_json(
            FOLLOWERS_LIST_PATH,
            &[
                ("user_id", user_id.to_string()),
                ("count", FOLLOWERS_PAGE_SIZE.to_string()),
            ],
        )?;
        Ok(page.users)
    }

    /// Replace the account's profile image with `image` (raw file bytes).
    pub fn update_profile_image(&self, image: &[u8]) -> Result<ApiResponse> {
        let url = self.url(UPDATE_PROFILE_IMAGE_PATH);
        let encoded = STANDARD.encode(image);
        self.post_form(&url, &[("image", encoded)], self.base_headers())
            .context("Failed to update profile image")
    }
}

/// Turn a non-2xx response into an error carrying status and body.
fn check_status(res: Response, what: &str) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let txt = res.text().unwrap_or_else(|_| "".into());
    anyhow::bail!("Request to {} failed: {} - {}", what, status, txt)
}

fn into_api_response(res: Response, what: &str) -> Result<ApiResponse> {
    let res = check_status(res, what)?;
    let status = res.status();
    let headers = res.headers().clone();
    let body = res.text().context("Failed to read response body")?;
    let data = if body.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&body).with_context(|| format!("Parsing {} response json", what))?
    };
    Ok(ApiResponse {
        data,
        status,
        headers,
    })
}

impl AuthenticatedPost for ApiClient {
    fn api_base_url(&self) -> &str {
        &self.base_url
    }

    fn base_headers(&self) -> HeaderMap {
        self.base_headers.clone()
    }

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        debug!("Sending form POST to {}", url);
        // `form` overwrites any content-type left in `headers`
        let res = self
            .client
            .post(url)
            .headers(headers)
            .form(form)
            .send()
            .context("Failed to send POST request")?;
        into_api_response(res, url)
    }

    fn post_multipart(
        &self,
        url: &str,
        form: multipart::Form,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        debug!("Sending multipart POST to {}", url);
        let res = self
            .client
            .post(url)
            .headers(headers)
            .multipart(form)
            .send()
            .context("Failed to send multipart request")?;
        into_api_response(res, url)
    }
}

#[cfg(test)]
mod tests_api_client {
    use super::*;
    use crate::banner::{BannerUpdate, ProfileBannerExt};
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            auth_info_1: "alice".into(),
            auth_info_2: "alice@example.com".into(),
            password: "hunter2".into(),
        }
    }

    fn logged_in(server: &mut Server) -> ApiClient {
        let _login = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"auth_token": "tok", "ct0": "csrf"}"#)
            .create();
        let mut client = ApiClient::new(&server.url()).unwrap();
        client.login(&credentials()).unwrap();
        client
    }

    #[test]
    fn test_login_stores_auth_headers() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", LOGIN_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("auth_info_1".into(), "alice".into()),
                Matcher::UrlEncoded("auth_info_2".into(), "alice@example.com".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"auth_token": "tok", "ct0": "csrf"}"#)
            .create();

        let mut client = ApiClient::new(&server.url()).unwrap();
        assert!(!client.is_authenticated());
        client.login(&credentials()).unwrap();

        mock.assert();
        assert!(client.is_authenticated());
        let headers = client.base_headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert_eq!(headers.get("x-csrf-token").unwrap(), "csrf");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_login_failure() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", LOGIN_PATH)
            .with_status(401)
            .with_body("Unauthorized")
            .create();

        let mut client = ApiClient::new(&server.url()).unwrap();
        let err = client.login(&credentials()).unwrap_err();
        assert!(err.to_string().contains("Login failed: 401"));
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_get_user_by_screen_name() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let mock = server
            .mock("GET", USERS_SHOW_PATH)
            .match_query(Matcher::UrlEncoded("screen_name".into(), "bob".into()))
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 99, "id_str": "99", "name": "Bob", "screen_name": "bob"}"#)
            .create();

        let user = client.get_user_by_screen_name("bob").unwrap();
        mock.assert();
        assert_eq!(user.id_str.as_deref(), Some("99"));
        assert_eq!(user.screen_name.as_deref(), Some("bob"));
    }

    #[test]
    fn test_get_user_followers() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let mock = server
            .mock("GET", FOLLOWERS_LIST_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("user_id".into(), "99".into()),
                Matcher::UrlEncoded("count".into(), "20".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"users": [{"id_str": "1", "name": "One"}, {"id_str": "2", "name": "Two"}]})
                    .to_string(),
            )
            .create();

        let users = client.get_user_followers("99").unwrap();
        mock.assert();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name.as_deref(), Some("Two"));
    }

    #[test]
    fn test_update_profile_image_sends_base64() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let mock = server
            .mock("POST", UPDATE_PROFILE_IMAGE_PATH)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::UrlEncoded("image".into(), "AQID".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id_str": "1"}"#)
            .create();

        let resp = client.update_profile_image(&[1, 2, 3]).unwrap();
        mock.assert();
        assert_eq!(resp.data["id_str"], "1");
    }

    #[test]
    fn test_update_profile_banner_form() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let mock = server
            .mock("POST", crate::banner::UPDATE_PROFILE_BANNER_PATH)
            .match_header("authorization", "Bearer tok")
            .match_header("x-csrf-token", "csrf")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("media_id".into(), "555".into()),
                Matcher::UrlEncoded("width".into(), "1500".into()),
                Matcher::UrlEncoded("height".into(), "500".into()),
                Matcher::UrlEncoded("offset_left".into(), "0".into()),
                Matcher::UrlEncoded("offset_top".into(), "0".into()),
            ]))
            .with_status(201)
            .create();

        let resp = client
            .update_profile_banner(&BannerUpdate::new("555"))
            .unwrap();
        mock.assert();
        assert_eq!(resp.status.as_u16(), 201);
        assert_eq!(resp.data, serde_json::Value::Null);
    }

    #[test]
    fn test_upload_profile_banner_multipart() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let mock = server
            .mock("POST", crate::banner::UPDATE_PROFILE_BANNER_PATH)
            .match_header("authorization", "Bearer tok")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="banner"; filename="banner.jpg""#.into()),
                Matcher::Regex("Content-Type: image/jpeg".into()),
            ]))
            .with_status(200)
            .create();

        client.upload_profile_banner(b"jpegdata".to_vec()).unwrap();
        mock.assert();
    }

    #[test]
    fn test_post_error_status() {
        let mut server = Server::new();
        let client = logged_in(&mut server);
        let _mock = server
            .mock("POST", crate::banner::UPDATE_PROFILE_BANNER_PATH)
            .with_status(400)
            .with_body("Bad Request")
            .create();

        let err = client
            .update_profile_banner(&BannerUpdate::new("1"))
            .unwrap_err();
        let chain = format!("{:?}", err);
        assert!(chain.contains("400"));
    }
}
