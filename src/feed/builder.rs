use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::rss::{self, Feed, Item};
use crate::upstream::{validate_subject, RawArticle, SubjectError, UpstreamClient, UpstreamError};

/// Upper bound on concurrent upstream fetches within one build.
const MAX_CONCURRENT_FETCHES: usize = 4;

const SITE_URL: &str = "https://leetcode.com/";
const FEED_TITLE: &str = "LeetCode Solution Articles";
const FEED_DESCRIPTION: &str = "Auto-generated RSS feed of LeetCode Solution Articles (Discuss).";

/// Errors that can fail a feed build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A subject failed validation; rejected before any fetch.
    #[error(transparent)]
    InvalidSubject(#[from] SubjectError),
    /// One subject's fetch failed, which fails the whole build.
    #[error("fetching articles for {subject}: {source}")]
    Upstream {
        subject: String,
        #[source]
        source: UpstreamError,
    },
    /// The whole-build deadline expired before all fetches finished.
    #[error("feed build timed out")]
    Deadline,
    /// XML serialization failed.
    #[error("rendering feed: {0}")]
    Render(String),
}

/// Builds rendered feeds from a set of subjects.
pub struct FeedBuilder {
    upstream: Arc<UpstreamClient>,
}

impl FeedBuilder {
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        Self { upstream }
    }

    /// Builds the rendered RSS bytes for `subjects`.
    ///
    /// Subjects are validated before any network work. Per-subject fetches
    /// run concurrently, capped at `min(4, subjects.len())`; the first
    /// failure cancels the remaining in-flight fetches and fails the whole
    /// build rather than degrading to a partial feed.
    pub async fn build(
        &self,
        subjects: &[String],
        limit: i64,
        self_url: Option<&str>,
    ) -> Result<Vec<u8>, BuildError> {
        for subject in subjects {
            validate_subject(subject)?;
        }

        let articles = self.fetch_all(subjects, limit).await?;
        tracing::debug!(
            subjects = subjects.len(),
            articles = articles.len(),
            "Assembling feed"
        );

        let feed = assemble(subjects, articles, self_url);
        rss::render(&feed).map_err(|e| BuildError::Render(e.to_string()))
    }

    /// Fan-out across subjects. All subjects are dispatched; successful
    /// results append to a shared collection under a lock. `try_collect`
    /// returns on the first error and drops the stream, which cancels the
    /// fetches still in flight.
    async fn fetch_all(
        &self,
        subjects: &[String],
        limit: i64,
    ) -> Result<Vec<RawArticle>, BuildError> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let cap = subjects.len().min(MAX_CONCURRENT_FETCHES);
        let collected = Arc::new(Mutex::new(Vec::new()));

        stream::iter(subjects.iter().cloned())
            .map(|subject| {
                let upstream = Arc::clone(&self.upstream);
                let collected = Arc::clone(&collected);
                async move {
                    let articles = upstream
                        .fetch_solution_articles(&subject, limit)
                        .await
                        .map_err(|source| BuildError::Upstream {
                            subject: subject.clone(),
                            source,
                        })?;
                    collected
                        .lock()
                        .expect("article collection lock poisoned")
                        .extend(articles);
                    Ok::<(), BuildError>(())
                }
            })
            .buffer_unordered(cap)
            .try_collect::<Vec<()>>()
            .await?;

        let articles = std::mem::take(
            &mut *collected
                .lock()
                .expect("article collection lock poisoned"),
        );
        Ok(articles)
    }
}

struct TimedArticle {
    article: RawArticle,
    created_at: Option<DateTime<Utc>>,
}

/// Total order for merged articles: items with a parseable timestamp sort
/// before those without; newer first; higher topic id breaks ties and
/// orders the unparseable group. Fetch completion order never leaks into
/// the output.
fn compare(a: &TimedArticle, b: &TimedArticle) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y
            .cmp(&x)
            .then_with(|| b.article.topic_id.cmp(&a.article.topic_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.article.topic_id.cmp(&a.article.topic_id),
    }
}

fn assemble(subjects: &[String], articles: Vec<RawArticle>, self_url: Option<&str>) -> Feed {
    let mut timed: Vec<TimedArticle> = articles
        .into_iter()
        .map(|article| {
            let created_at = DateTime::parse_from_rfc3339(&article.created_at)
                .ok()
                .map(|t| t.with_timezone(&Utc));
            TimedArticle {
                article,
                created_at,
            }
        })
        .collect();
    timed.sort_by(compare);

    let items = timed
        .into_iter()
        .map(|timed| {
            // Unparseable timestamps pin to the epoch; "now" would make
            // renders non-deterministic and break conditional caching.
            let pub_date = timed.created_at.unwrap_or(DateTime::UNIX_EPOCH);
            let article = timed.article;
            Item {
                link: article_link(&article),
                guid: format!("{}:{}", article.topic_id, article.uuid),
                pub_date,
                summary: format!(
                    "Solution for {} ({}). Hits: {}",
                    article.question_title, article.question_slug, article.hit_count
                ),
                title: article.title,
            }
        })
        .collect();

    Feed {
        title: feed_title(subjects),
        link: feed_link(subjects),
        description: FEED_DESCRIPTION.to_string(),
        self_link: self_url.map(str::to_string),
        items,
    }
}

/// One subject gets a personalized title; several fall back to the generic
/// title rather than concatenating an unwieldy list.
fn feed_title(subjects: &[String]) -> String {
    match subjects {
        [only] => format!("{FEED_TITLE} — {only}"),
        _ => FEED_TITLE.to_string(),
    }
}

fn feed_link(subjects: &[String]) -> String {
    match subjects.first() {
        Some(first) => format!("{SITE_URL}{first}/"),
        None => SITE_URL.to_string(),
    }
}

fn article_link(article: &RawArticle) -> String {
    if article.question_slug.is_empty() {
        format!(
            "{SITE_URL}discuss/post/{}/{}/",
            article.topic_id, article.slug
        )
    } else {
        format!(
            "{SITE_URL}problems/{}/solutions/{}/{}/",
            article.question_slug, article.topic_id, article.slug
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn raw(topic_id: i64, created_at: &str) -> RawArticle {
        RawArticle {
            topic_id,
            uuid: format!("uuid-{topic_id}"),
            title: format!("Solution {topic_id}"),
            slug: format!("solution-{topic_id}"),
            created_at: created_at.to_string(),
            hit_count: 1,
            question_slug: "two-sum".to_string(),
            question_title: "Two Sum".to_string(),
        }
    }

    fn sorted_topic_ids(articles: Vec<RawArticle>) -> Vec<i64> {
        let feed = assemble(&[], articles, None);
        feed.items
            .iter()
            .map(|item| {
                item.guid
                    .split(':')
                    .next()
                    .unwrap()
                    .parse::<i64>()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_newer_timestamp_first() {
        let ids = sorted_topic_ids(vec![
            raw(200, "2024-01-01T00:00:00+00:00"),
            raw(100, "2024-01-02T00:00:00+00:00"),
        ]);
        assert_eq!(ids, vec![100, 200]);
    }

    #[test]
    fn test_equal_timestamps_break_on_topic_id() {
        let ids = sorted_topic_ids(vec![
            raw(5, "2024-01-01T00:00:00+00:00"),
            raw(9, "2024-01-01T00:00:00+00:00"),
            raw(7, "2024-01-01T00:00:00+00:00"),
        ]);
        assert_eq!(ids, vec![9, 7, 5]);
    }

    #[test]
    fn test_unparseable_timestamps_sort_last_by_topic_id() {
        let ids = sorted_topic_ids(vec![
            raw(1, "garbage"),
            raw(3, "2020-06-01T00:00:00+00:00"),
            raw(8, ""),
            raw(2, "2024-06-01T00:00:00+00:00"),
        ]);
        assert_eq!(ids, vec![2, 3, 8, 1]);
    }

    #[test]
    fn test_unparseable_timestamp_pins_to_epoch() {
        let feed = assemble(&[], vec![raw(1, "not-a-date")], None);
        assert_eq!(feed.items[0].pub_date, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_fractional_offset_timestamps_parse() {
        // Upstream emits timestamps like 2026-01-07T03:52:30.464981+00:00.
        let feed = assemble(&[], vec![raw(1, "2024-01-07T03:52:30.464981+00:00")], None);
        assert_ne!(feed.items[0].pub_date, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_article_link_prefers_question_slug() {
        let with_question = raw(42, "2024-01-01T00:00:00+00:00");
        assert_eq!(
            article_link(&with_question),
            "https://leetcode.com/problems/two-sum/solutions/42/solution-42/"
        );

        let mut without = raw(42, "2024-01-01T00:00:00+00:00");
        without.question_slug.clear();
        assert_eq!(
            article_link(&without),
            "https://leetcode.com/discuss/post/42/solution-42/"
        );
    }

    #[test]
    fn test_guid_is_topic_id_and_uuid() {
        let feed = assemble(&[], vec![raw(42, "2024-01-01T00:00:00+00:00")], None);
        assert_eq!(feed.items[0].guid, "42:uuid-42");
    }

    #[test]
    fn test_title_and_link_by_subject_count() {
        let none: Vec<String> = vec![];
        let one = vec!["alice".to_string()];
        let two = vec!["alice".to_string(), "bob".to_string()];

        assert_eq!(feed_title(&none), "LeetCode Solution Articles");
        assert_eq!(feed_title(&one), "LeetCode Solution Articles — alice");
        assert_eq!(feed_title(&two), "LeetCode Solution Articles");

        assert_eq!(feed_link(&none), "https://leetcode.com/");
        assert_eq!(feed_link(&one), "https://leetcode.com/alice/");
        assert_eq!(feed_link(&two), "https://leetcode.com/alice/");
    }

    #[test]
    fn test_invalid_subject_rejected_before_fetch() {
        // The endpoint is unroutable; validation must fail first.
        let upstream = Arc::new(UpstreamClient::new(
            "http://127.0.0.1:1/graphql/",
            reqwest::Client::new(),
        ));
        let builder = FeedBuilder::new(upstream);
        let subjects = vec!["ok".to_string(), "bad subject".to_string()];

        let result = futures::executor::block_on(builder.build(&subjects, 15, None));
        assert!(matches!(result, Err(BuildError::InvalidSubject(_))));
    }

    fn arb_article() -> impl Strategy<Value = RawArticle> {
        let timestamp = prop_oneof![
            (1i64..2_000_000_000).prop_map(|secs| {
                DateTime::from_timestamp(secs, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH)
                    .to_rfc3339()
            }),
            Just("not-a-timestamp".to_string()),
            Just(String::new()),
        ];
        (0i64..100_000, timestamp).prop_map(|(topic_id, created_at)| raw(topic_id, &created_at))
    }

    proptest! {
        /// The rendered order satisfies the pairwise total order for any
        /// input, including duplicate timestamps and malformed ones.
        #[test]
        fn prop_output_respects_total_order(articles in prop::collection::vec(arb_article(), 0..24)) {
            let feed = assemble(&[], articles, None);
            let timed: Vec<TimedArticle> = feed
                .items
                .iter()
                .map(|item| {
                    let mut parts = item.guid.split(':');
                    let topic_id = parts.next().unwrap().parse().unwrap();
                    TimedArticle {
                        article: raw(topic_id, ""),
                        created_at: (item.pub_date != DateTime::UNIX_EPOCH).then_some(item.pub_date),
                    }
                })
                .collect();
            for pair in timed.windows(2) {
                prop_assert_ne!(compare(&pair[0], &pair[1]), Ordering::Greater);
            }
        }

        /// Same items in, byte-identical bytes out.
        #[test]
        fn prop_render_is_idempotent(articles in prop::collection::vec(arb_article(), 0..12)) {
            let first = rss::render(&assemble(&[], articles.clone(), None)).unwrap();
            let second = rss::render(&assemble(&[], articles, None)).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
