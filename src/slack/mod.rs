mod api;
mod client;
mod types;

pub use api::SlackApi;
pub use client::SlackClient;
pub use types::{
    BotIdentity, ChannelId, ConversationPage, ConversationType, ConversationsQuery, MessageTs,
    OutgoingMessage, RawChannel, RawUser,
};
