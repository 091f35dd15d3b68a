//! Cursor-driven paging over `conversations.list`

use crate::config::{DirectoryConfig, SlackConfig};
use crate::error::{BroadcasterError, Result};
use crate::slack::{ConversationPage, ConversationType, ConversationsQuery, RawChannel, SlackApi};
use futures::{Stream, StreamExt, stream};
use std::time::Duration;

/// How to page through the conversation list
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub page_size: u16,
    pub types: Vec<ConversationType>,
    pub exclude_archived: bool,
    /// Hard cap; asking for one page more fails with `PageLimitExceeded`
    pub max_pages: usize,
    /// Extra attempts per page, only for `UpstreamUnavailable`
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_size: 200,
            types: ConversationType::ALL.to_vec(),
            exclude_archived: true,
            max_pages: 1000,
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl PageQuery {
    pub fn from_config(directory: &DirectoryConfig, slack: &SlackConfig) -> Self {
        Self {
            page_size: directory.page_size,
            max_pages: directory.max_pages,
            max_retries: slack.max_retries,
            ..Self::default()
        }
    }
}

/// One fetched page, numbered from 1
#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub channels: Vec<RawChannel>,
}

enum PagerState {
    Next {
        cursor: Option<String>,
        fetched: usize,
    },
    Done,
}

/// Lazily fetch pages until the cursor runs out.
///
/// The stream ends after the first page with an empty or missing cursor. A
/// failed page is yielded as the final item. Going past `max_pages` yields
/// `PageLimitExceeded` without calling Slack.
pub fn conversation_pages<'a>(
    api: &'a dyn SlackApi,
    query: &'a PageQuery,
) -> impl Stream<Item = Result<Page>> + 'a {
    let initial = PagerState::Next {
        cursor: None,
        fetched: 0,
    };

    stream::unfold(initial, move |state| async move {
        let PagerState::Next { cursor, fetched } = state else {
            return None;
        };

        if fetched >= query.max_pages {
            return Some((
                Err(BroadcasterError::PageLimitExceeded(query.max_pages)),
                PagerState::Done,
            ));
        }

        let request = ConversationsQuery {
            cursor,
            limit: query.page_size,
            types: query.types.clone(),
            exclude_archived: query.exclude_archived,
        };

        match fetch_page(api, &request, query).await {
            Ok(ConversationPage {
                channels,
                next_cursor,
            }) => {
                let number = fetched + 1;
                let next = match next_cursor.filter(|c| !c.is_empty()) {
                    Some(cursor) => PagerState::Next {
                        cursor: Some(cursor),
                        fetched: number,
                    },
                    None => PagerState::Done,
                };
                Some((Ok(Page { number, channels }), next))
            }
            Err(e) => Some((Err(e), PagerState::Done)),
        }
    })
}

async fn fetch_page(
    api: &dyn SlackApi,
    request: &ConversationsQuery,
    query: &PageQuery,
) -> Result<ConversationPage> {
    let mut attempt = 0u32;
    loop {
        match api.list_conversations(request).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() && attempt < query.max_retries => {
                attempt += 1;
                tracing::warn!(
                    attempt = attempt,
                    max_retries = query.max_retries,
                    error = %e,
                    "conversations.list unavailable, retrying page"
                );
                tokio::time::sleep(query.retry_backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Everything pagination managed to collect
#[derive(Debug)]
pub struct PaginationOutcome {
    pub channels: Vec<RawChannel>,
    pub pages: usize,
    /// Set when a page failed and the collection is partial
    pub stopped_by: Option<BroadcasterError>,
}

impl PaginationOutcome {
    pub fn is_complete(&self) -> bool {
        self.stopped_by.is_none()
    }
}

/// Drain the page stream, keeping whatever arrived before an upstream failure.
///
/// Only the page cap is a hard error.
pub async fn collect_conversations(
    api: &dyn SlackApi,
    query: &PageQuery,
) -> Result<PaginationOutcome> {
    let mut outcome = PaginationOutcome {
        channels: Vec::new(),
        pages: 0,
        stopped_by: None,
    };

    let mut pages = std::pin::pin!(conversation_pages(api, query));
    while let Some(page) = pages.next().await {
        match page {
            Ok(page) => {
                outcome.pages = page.number;
                outcome.channels.extend(page.channels);
                tracing::debug!(
                    page = page.number,
                    total = outcome.channels.len(),
                    "Fetched conversations page"
                );
            }
            Err(e @ BroadcasterError::PageLimitExceeded(_)) => {
                tracing::error!(
                    pages = outcome.pages,
                    error = %e,
                    "Aborting pagination, upstream keeps returning cursors"
                );
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    pages = outcome.pages,
                    collected = outcome.channels.len(),
                    error = %e,
                    "Stopping pagination early, keeping partial results"
                );
                outcome.stopped_by = Some(e);
            }
        }
    }

    Ok(outcome)
}
