// Profile banner extension: the session only knows how to do authenticated
// POSTs, this module layers the banner update on top of that capability.
// Callers opt in by importing `ProfileBannerExt`.

use anyhow::{Context, Result};
use reqwest::blocking::multipart;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

/// Path of the banner endpoint, relative to the API origin.
pub const UPDATE_PROFILE_BANNER_PATH: &str = "/1.1/account/update_profile_banner.json";

/// Parsed body plus the bits of the raw response callers may want to look
/// at. An empty body parses to `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: serde_json::Value,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Authenticated POST to an arbitrary URL. Implementors own the default
/// headers that carry auth; every call takes the headers explicitly so the
/// caller decides what goes on the wire.
pub trait AuthenticatedPost {
    /// API origin the relative endpoint paths are joined to.
    fn api_base_url(&self) -> &str;

    /// A copy of the session's default headers.
    fn base_headers(&self) -> HeaderMap;

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<ApiResponse>;

    fn post_multipart(
        &self,
        url: &str,
        form: multipart::Form,
        headers: HeaderMap,
    ) -> Result<ApiResponse>;
}

/// Arguments of a banner update. `media_id` is required; the geometry
/// defaults to a 1500x500 banner with no offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerUpdate {
    pub media_id: String,
    pub width: u32,
    pub height: u32,
    pub offset_left: u32,
    pub offset_top: u32,
}

impl BannerUpdate {
    pub fn new(media_id: impl Into<String>) -> Self {
        BannerUpdate {
            media_id: media_id.into(),
            width: 1500,
            height: 500,
            offset_left: 0,
            offset_top: 0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_offset(mut self, left: u32, top: u32) -> Self {
        self.offset_left = left;
        self.offset_top = top;
        self
    }

    /// Url-encoded form fields, in wire order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("media_id", self.media_id.clone()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("offset_left", self.offset_left.to_string()),
            ("offset_top", self.offset_top.to_string()),
        ]
    }
}

/// Default headers with every `content-type` entry removed, so the
/// multipart encoder can set its own boundary.
pub fn multipart_headers(base: &HeaderMap) -> HeaderMap {
    let mut headers = base.clone();
    headers.remove(CONTENT_TYPE);
    headers
}

/// Banner operations for any client that can do authenticated POSTs.
pub trait ProfileBannerExt: AuthenticatedPost {
    fn profile_banner_url(&self) -> String {
        format!("{}{}", self.api_base_url(), UPDATE_PROFILE_BANNER_PATH)
    }

    /// Point the banner at already-uploaded media. Sends the five form
    /// fields with the session's default headers. Not retried.
    fn update_profile_banner(&self, update: &BannerUpdate) -> Result<ApiResponse> {
        let url = self.profile_banner_url();
        debug!("Updating profile banner with media {}", update.media_id);
        let fields = update.form_fields();
        self.post_form(&url, &fields, self.base_headers())
            .context("Failed to update profile banner")
    }

    /// Upload raw image bytes as the new banner, as multipart field
    /// `banner` named `banner.jpg`.
    fn upload_profile_banner(&self, image: Vec<u8>) -> Result<ApiResponse> {
        let url = self.profile_banner_url();
        debug!("Uploading {} byte profile banner", image.len());
        let part = multipart::Part::bytes(image)
            .file_name("banner.jpg")
            .mime_str("image/jpeg")
            .context("Invalid banner mime type")?;
        let form = multipart::Form::new().part("banner", part);
        let headers = multipart_headers(&self.base_headers());
        self.post_multipart(&url, form, headers)
            .context("Failed to upload profile banner")
    }
}

impl<T: AuthenticatedPost + ?Sized> ProfileBannerExt for T {}
