//! Admin API client for the content store.
//!
//! This crate provides:
//! - [`AdminClient`] — authenticated reqwest client over the Admin API
//! - [`AdminClient::browse_by_ids`] — filtered, internally paginated post
//!   discovery (see [`browse`])
//! - [`AdminClient::edit_post`] — conditional write-back under the post's
//!   `updated_at` stamp

mod browse;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use postnote_shared::{PostnoteError, Result};
use postnote_transform::UpdatedContent;

/// User-Agent string for Admin API requests.
const USER_AGENT: &str = concat!("Postnote/", env!("CARGO_PKG_VERSION"));

/// Admin API version requested from the store.
const API_VERSION: &str = "v5.0";

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Request timeout in seconds.
const TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// AdminClient
// ---------------------------------------------------------------------------

/// Authenticated client for one Admin API endpoint.
pub struct AdminClient {
    http: Client,
    /// Posts collection URL, with trailing slash.
    posts_base: String,
    page_size: u32,
}

impl AdminClient {
    /// Build a client for the given (already normalized) API base URL.
    pub fn new(api_url: &Url, admin_key: &str, page_size: u32) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Ghost {admin_key}"))
            .map_err(|e| PostnoteError::config(format!("invalid admin key: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Accept-Version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| PostnoteError::Transport(format!("failed to build HTTP client: {e}")))?;

        let posts_base = format!(
            "{}/ghost/api/admin/posts/",
            api_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            http,
            posts_base,
            page_size,
        })
    }

    /// Write the updated content back, conditioned on the `updated_at` stamp.
    ///
    /// A stale stamp maps to [`PostnoteError::Conflict`]; any other failure
    /// maps to [`PostnoteError::Transport`].
    #[instrument(skip_all, fields(post_id = %id))]
    pub async fn edit_post(
        &self,
        id: &str,
        updated_at: &str,
        content: &UpdatedContent,
    ) -> Result<EditedPost> {
        let url = format!("{}{id}/", self.posts_base);

        let mut post = serde_json::Map::new();
        post.insert("updated_at".into(), updated_at.into());
        match content {
            UpdatedContent::Lexical(lexical) => post.insert("lexical".into(), lexical.as_str().into()),
            UpdatedContent::Html(html) => post.insert("html".into(), html.as_str().into()),
        };
        let body = serde_json::json!({ "posts": [post] });

        let response = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostnoteError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(edit_failure(&url, status, response).await);
        }

        let envelope: PostsEnvelope = response
            .json()
            .await
            .map_err(|e| PostnoteError::Transport(format!("{url}: invalid response body: {e}")))?;

        let edited = envelope
            .posts
            .into_iter()
            .next()
            .ok_or_else(|| PostnoteError::Transport(format!("{url}: empty posts envelope")))?;

        debug!(url = edited.url.as_deref().unwrap_or(""), "post updated");
        Ok(edited)
    }
}

/// Map a failed edit response to the right error kind.
async fn edit_failure(url: &str, status: StatusCode, response: reqwest::Response) -> PostnoteError {
    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ErrorEnvelope> = serde_json::from_str(&body).ok();
    let api_error = parsed.and_then(|e| e.errors.into_iter().next());

    let message = api_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let kind = api_error.and_then(|e| e.kind);

    if status == StatusCode::CONFLICT || kind.as_deref() == Some("UpdateCollisionError") {
        PostnoteError::conflict(message)
    } else {
        PostnoteError::Transport(format!("{url}: {message}"))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The post returned by a successful edit.
#[derive(Debug, Clone, Deserialize)]
pub struct EditedPost {
    pub id: String,
    /// Public URL of the updated post, when the store includes it.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    posts: Vec<EditedPost>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}
