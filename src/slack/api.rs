use crate::error::Result;
use crate::slack::{BotIdentity, ConversationPage, ConversationsQuery, MessageTs, OutgoingMessage, RawUser};
use async_trait::async_trait;

/// The subset of the Slack Web API the broadcaster talks to.
///
/// Implementations surface Slack-side `ok=false` responses as
/// `UpstreamRejected` and transport failures or timeouts as
/// `UpstreamUnavailable`, so callers can decide what is worth retrying.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `conversations.list`, one page
    async fn list_conversations(&self, query: &ConversationsQuery) -> Result<ConversationPage>;

    /// `users.list`, single call
    async fn list_users(&self) -> Result<Vec<RawUser>>;

    /// `auth.test`
    async fn auth_test(&self) -> Result<BotIdentity>;

    /// `chat.postMessage`
    async fn post_message(&self, message: &OutgoingMessage) -> Result<MessageTs>;
}
