use serde::{Deserialize, Serialize};
use std::fmt;

/// Any conversation id Slack accepts as a post target (C…, G…, D… or a U… user id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTs(pub String);

impl MessageTs {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Conversation types accepted by the `conversations.list` type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationType {
    Public,
    Private,
    Im,
    Mpim,
}

impl ConversationType {
    pub const ALL: [ConversationType; 4] = [
        ConversationType::Public,
        ConversationType::Private,
        ConversationType::Im,
        ConversationType::Mpim,
    ];
}

/// One `conversations.list` request
#[derive(Debug, Clone)]
pub struct ConversationsQuery {
    pub cursor: Option<String>,
    pub limit: u16,
    pub types: Vec<ConversationType>,
    pub exclude_archived: bool,
}

/// Channel-like record as returned by `conversations.list`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChannel {
    pub id: String,
    pub name: Option<String>,
    pub is_im: bool,
    pub is_mpim: bool,
    pub is_private: bool,
    pub is_archived: bool,
    pub num_members: Option<u64>,
}

/// One page of `conversations.list`
#[derive(Debug, Clone, Default)]
pub struct ConversationPage {
    pub channels: Vec<RawChannel>,
    pub next_cursor: Option<String>,
}

/// Member record as returned by `users.list`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawUser {
    pub id: String,
    /// Short handle (e.g. "john.doe")
    pub name: Option<String>,
    pub real_name: Option<String>,
    /// Profile display name, often empty in Slack
    pub display_name: Option<String>,
    pub deleted: bool,
    pub is_bot: bool,
}

/// Identity of the bot credential as reported by `auth.test`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotIdentity {
    pub user_id: String,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

/// A `chat.postMessage` payload
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub channel: ChannelId,
    pub text: String,
    pub username: Option<String>,
}
