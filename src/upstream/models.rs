use serde::Deserialize;

/// One solution article as returned by the upstream API.
///
/// `created_at` is kept as the raw string: the upstream timestamp format is
/// not guaranteed, so parsing is deferred to the merge step where a parse
/// failure degrades the item's sort position instead of failing the fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub topic_id: i64,
    pub uuid: String,
    pub title: String,
    pub slug: String,
    pub created_at: String,
    #[serde(default)]
    pub hit_count: i64,
    #[serde(default)]
    pub question_slug: String,
    #[serde(default)]
    pub question_title: String,
}

/// Top-level GraphQL response envelope. A non-empty `errors` list is a hard
/// failure even when `data` is present.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticlesEnvelope {
    #[serde(default)]
    pub data: Option<EnvelopeData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeData {
    #[serde(rename = "ugcArticleUserSolutionArticles", default)]
    pub articles: Option<ArticleConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticleConnection {
    #[serde(default)]
    pub edges: Vec<ArticleEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticleEdge {
    pub node: RawArticle,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_articles() {
        let body = r#"{
            "data": {
                "ugcArticleUserSolutionArticles": {
                    "totalNum": 1,
                    "pageInfo": {"hasNextPage": false},
                    "edges": [{"node": {
                        "topicId": 100,
                        "uuid": "abc-123",
                        "title": "Two Sum in O(n)",
                        "slug": "two-sum-in-on",
                        "createdAt": "2024-01-02T00:00:00+00:00",
                        "hitCount": 42,
                        "questionSlug": "two-sum",
                        "questionTitle": "Two Sum"
                    }}]
                }
            }
        }"#;

        let envelope: ArticlesEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.errors.is_empty());
        let edges = envelope.data.unwrap().articles.unwrap().edges;
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].node.topic_id, 100);
        assert_eq!(edges[0].node.question_slug, "two-sum");
    }

    #[test]
    fn test_envelope_with_errors() {
        let body = r#"{"data": null, "errors": [{"message": "user not found"}]}"#;
        let envelope: ArticlesEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[0].message, "user not found");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let body = r#"{
            "topicId": 7,
            "uuid": "u",
            "title": "t",
            "slug": "s",
            "createdAt": "not-a-date"
        }"#;
        let article: RawArticle = serde_json::from_str(body).unwrap();
        assert_eq!(article.hit_count, 0);
        assert!(article.question_slug.is_empty());
        assert!(article.question_title.is_empty());
    }
}
