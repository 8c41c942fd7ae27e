//! Filtered post discovery with internal pagination.

use serde::Deserialize;
use tracing::{debug, info, instrument};

use postnote_shared::{PostRecord, PostnoteError, Result};

use crate::AdminClient;

/// Metadata fields requested alongside the content formats.
const BROWSE_FIELDS: &str = "id,title,slug,url,html,updated_at";

/// All content representations, so the transform can pick by precedence.
const BROWSE_FORMATS: &str = "html,lexical,mobiledoc";

impl AdminClient {
    /// Fetch the posts matching the given ids, paging until exhausted.
    ///
    /// Records come back in whatever order the store yields them. An empty
    /// id list returns an empty Vec without a network call.
    #[instrument(skip_all, fields(ids = ids.len()))]
    pub async fn browse_by_ids(&self, ids: &[String]) -> Result<Vec<PostRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = format!("id:[{}]", ids.join(","));
        let limit = self.page_size.to_string();
        let mut posts = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_param = page.to_string();
            let response = self
                .http
                .get(&self.posts_base)
                .query(&[
                    ("filter", filter.as_str()),
                    ("fields", BROWSE_FIELDS),
                    ("formats", BROWSE_FORMATS),
                    ("limit", limit.as_str()),
                    ("page", page_param.as_str()),
                ])
                .send()
                .await
                .map_err(|e| PostnoteError::Discovery(format!("{}: {e}", self.posts_base)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PostnoteError::Discovery(format!(
                    "{}: HTTP {status}",
                    self.posts_base
                )));
            }

            let envelope: BrowseEnvelope = response.json().await.map_err(|e| {
                PostnoteError::Discovery(format!("{}: invalid response body: {e}", self.posts_base))
            })?;

            debug!(page, fetched = envelope.posts.len(), "browse page complete");
            posts.extend(envelope.posts);

            match envelope.meta.pagination.next {
                Some(next) => page = next,
                None => break,
            }
        }

        info!(found = posts.len(), "post discovery complete");
        Ok(posts)
    }
}

#[derive(Debug, Deserialize)]
struct BrowseEnvelope {
    posts: Vec<PostRecord>,
    meta: BrowseMeta,
}

#[derive(Debug, Deserialize)]
struct BrowseMeta {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "updated_at": "2024-05-01T10:00:00.000Z",
            "html": "<p>body</p>"
        })
    }

    async fn client_for(server: &MockServer, page_size: u32) -> AdminClient {
        let base = Url::parse(&server.uri()).unwrap();
        AdminClient::new(&base, "key", page_size).unwrap()
    }

    #[tokio::test]
    async fn browses_with_membership_filter_and_formats() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("filter", "id:[a,b]"))
            .and(query_param("formats", "html,lexical,mobiledoc"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [post_json("a", "First"), post_json("b", "Second")],
                "meta": {"pagination": {"page": 1, "pages": 1, "next": null}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 100).await;
        let posts = client
            .browse_by_ids(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "First");
        assert_eq!(posts[1].updated_at, "2024-05-01T10:00:00.000Z");
    }

    #[tokio::test]
    async fn pages_until_exhausted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [post_json("a", "First")],
                "meta": {"pagination": {"page": 1, "pages": 2, "next": 2}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [post_json("b", "Second")],
                "meta": {"pagination": {"page": 2, "pages": 2, "next": null}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 1).await;
        let posts = client
            .browse_by_ids(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn empty_ids_is_a_no_op() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, 100).await;
        let posts = client.browse_by_ids(&[]).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn http_failure_maps_to_discovery_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, 100).await;
        let err = client.browse_by_ids(&["a".to_string()]).await.unwrap_err();

        assert!(matches!(err, PostnoteError::Discovery(_)));
        assert!(err.to_string().contains("503"));
    }
}
