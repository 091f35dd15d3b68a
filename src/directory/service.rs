use crate::config::{DirectoryConfig, UsersFailurePolicy};
use crate::directory::cache::DirectoryCache;
use crate::directory::merger::reconcile;
use crate::directory::paginator::{PageQuery, collect_conversations};
use crate::directory::{DestinationKind, Directory};
use crate::error::Result;
use crate::logging::Timer;
use crate::slack::SlackApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serves the directory from cache and rebuilds it from Slack on a miss
pub struct DirectoryService {
    api: Arc<dyn SlackApi>,
    cache: DirectoryCache,
    /// Collapses concurrent misses into one upstream fetch
    refresh_lock: Mutex<()>,
    query: PageQuery,
    ttl: Duration,
    users_failure_policy: UsersFailurePolicy,
}

impl DirectoryService {
    pub fn new(api: Arc<dyn SlackApi>, config: &DirectoryConfig, query: PageQuery) -> Self {
        tracing::info!(
            ttl_secs = config.cache_ttl_secs,
            page_size = query.page_size,
            max_pages = query.max_pages,
            users_failure_policy = ?config.users_failure_policy,
            "Creating directory service"
        );

        Self {
            api,
            cache: DirectoryCache::new(),
            refresh_lock: Mutex::new(()),
            query,
            ttl: config.cache_ttl(),
            users_failure_policy: config.users_failure_policy,
        }
    }

    #[cfg(test)]
    fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Cached directory, or a freshly built one if the cache is stale.
    ///
    /// Failed builds are not cached, so the next request tries again.
    pub async fn directory(&self) -> Result<Arc<Directory>> {
        if let Some(directory) = self.cache.get().await {
            return Ok(directory);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if let Some(directory) = self.cache.peek().await {
            tracing::debug!("Directory refreshed by a concurrent request");
            return Ok(directory);
        }

        tracing::info!("Cache expired or empty, fetching directory from Slack");
        let directory = Arc::new(self.fetch().await?);
        self.cache.put(directory.clone(), self.ttl).await;
        self.cache.log_stats().await;

        Ok(directory)
    }

    /// Fetch all channel pages and the user list, then merge. Bypasses the cache.
    pub async fn fetch(&self) -> Result<Directory> {
        let timer = Timer::new("fetch_directory");

        let pagination = collect_conversations(self.api.as_ref(), &self.query).await?;
        tracing::info!(
            pages = pagination.pages,
            channels = pagination.channels.len(),
            complete = pagination.is_complete(),
            "Fetched conversations"
        );

        let users = self.api.list_users().await;
        match &users {
            Ok(users) => tracing::info!(users = users.len(), "Fetched users"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch users"),
        }

        let directory = reconcile(pagination, users, self.users_failure_policy)?;

        tracing::info!(
            channels = directory.count_kind(DestinationKind::Channel),
            groups = directory.count_kind(DestinationKind::Group),
            direct_messages = directory.count_kind(DestinationKind::DirectMessage),
            users = directory.count_kind(DestinationKind::User),
            duration_ms = timer.elapsed_ms(),
            "Directory built"
        );

        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BroadcasterError;
    use crate::testing::{FakeSlack, channel, user};

    fn service(api: Arc<FakeSlack>, policy: UsersFailurePolicy) -> DirectoryService {
        let config = DirectoryConfig {
            users_failure_policy: policy,
            ..DirectoryConfig::default()
        };
        let query = PageQuery {
            retry_backoff: Duration::ZERO,
            ..PageQuery::from_config(&config, &crate::config::SlackConfig {
                bot_token: "xoxb-test".to_string(),
                api_timeout_secs: 10,
                max_retries: 2,
            })
        };
        DirectoryService::new(api, &config, query)
    }

    fn populated() -> FakeSlack {
        FakeSlack::new()
            .with_page(vec![channel("C1", "general")], Some("next"))
            .with_page(vec![channel("C2", "random")], None)
            .with_users(vec![user("U1", "alice", Some("Alice"))])
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_upstream() {
        let api = Arc::new(populated());
        let service = service(api.clone(), UsersFailurePolicy::Fail);

        let first = service.directory().await.unwrap();
        let second = service.directory().await.unwrap();

        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(api.conversation_calls(), 2);
        assert_eq!(api.user_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_refetches() {
        let api = Arc::new(populated());
        let service = service(api.clone(), UsersFailurePolicy::Fail);

        service.directory().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = service.directory().await.unwrap();

        // the script is exhausted, so the second build sees no channels
        assert_eq!(refreshed.len(), 1);
        assert_eq!(api.user_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let api = Arc::new(populated());
        let service = Arc::new(service(api.clone(), UsersFailurePolicy::Fail));

        let (a, b) = tokio::join!(service.directory(), service.directory());

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(api.user_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let api = Arc::new(
            FakeSlack::new()
                .with_page_error(BroadcasterError::UpstreamRejected("invalid_auth".into()))
                .with_users_error(BroadcasterError::UpstreamRejected("invalid_auth".into())),
        );
        let service = service(api.clone(), UsersFailurePolicy::Fail);

        let err = service.directory().await.unwrap_err();
        assert!(matches!(err, BroadcasterError::DirectoryFetch { .. }));
        assert!(service.cache().time_to_live().await.is_none());

        let _ = service.directory().await;
        assert_eq!(api.user_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_counts_one_miss() {
        let api = Arc::new(populated());
        let service = service(api, UsersFailurePolicy::Fail);

        service.directory().await.unwrap();
        service.directory().await.unwrap();

        let stats = service.cache().get_stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.hit_rate(), 50);
    }

    #[tokio::test]
    async fn test_channels_only_policy_serves_channels() {
        let api = Arc::new(
            FakeSlack::new()
                .with_page(vec![channel("C1", "general")], None)
                .with_users_error(BroadcasterError::UpstreamRejected("missing_scope".into())),
        );
        let service = service(api, UsersFailurePolicy::ChannelsOnly);

        let directory = service.directory().await.unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.destinations()[0].id, "C1");
    }
}
