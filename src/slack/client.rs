use crate::config::SlackConfig;
use crate::error::{BroadcasterError, Result};
use crate::slack::{
    BotIdentity, ConversationPage, ConversationType, ConversationsQuery, MessageTs,
    OutgoingMessage, RawChannel, RawUser, SlackApi,
};
use async_trait::async_trait;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Slack Web API client backed by slack-morphism's hyper connector
pub struct SlackClient {
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
    timeout: Duration,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let connector = SlackClientHyperConnector::new()
            .map_err(|e| BroadcasterError::UpstreamUnavailable(e.to_string()))?;

        let client = Arc::new(slack_morphism::SlackClient::new(connector));
        let token = SlackApiToken::new(config.bot_token.clone().into());

        Ok(Self {
            client,
            token,
            timeout: config.api_timeout(),
        })
    }

    async fn call<T, F>(&self, method: &'static str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, SlackClientError>>,
    {
        bounded_call(method, self.timeout, request).await
    }
}

/// Bound a Slack call by `timeout` and classify its failure
async fn bounded_call<T, F>(method: &'static str, timeout: Duration, request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, SlackClientError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => {
            let err = classify_error(e);
            tracing::debug!(method, error = %err, "Slack API call failed");
            Err(err)
        }
        Err(_) => {
            tracing::warn!(
                method,
                timeout_secs = timeout.as_secs(),
                "Slack API call timed out"
            );
            Err(BroadcasterError::UpstreamUnavailable(format!(
                "{method} timed out after {}s",
                timeout.as_secs()
            )))
        }
    }
}

fn classify_error(error: SlackClientError) -> BroadcasterError {
    match error {
        SlackClientError::ApiError(api) => classify_api_code(api.code),
        other => BroadcasterError::UpstreamUnavailable(other.to_string()),
    }
}

/// `ok=false` is final, except `ratelimited` which is worth another attempt
fn classify_api_code(code: String) -> BroadcasterError {
    if code == "ratelimited" {
        BroadcasterError::UpstreamUnavailable(code)
    } else {
        BroadcasterError::UpstreamRejected(code)
    }
}

fn to_morphism_type(kind: ConversationType) -> SlackConversationType {
    match kind {
        ConversationType::Public => SlackConversationType::Public,
        ConversationType::Private => SlackConversationType::Private,
        ConversationType::Im => SlackConversationType::Im,
        ConversationType::Mpim => SlackConversationType::Mpim,
    }
}

fn to_raw_channel(channel: SlackChannelInfo) -> RawChannel {
    RawChannel {
        id: channel.id.to_string(),
        name: channel.name,
        is_im: channel.flags.is_im.unwrap_or(false),
        is_mpim: channel.flags.is_mpim.unwrap_or(false),
        is_private: channel.flags.is_private.unwrap_or(false),
        is_archived: channel.flags.is_archived.unwrap_or(false),
        num_members: channel.num_members.map(|n| n as u64),
    }
}

fn to_raw_user(user: SlackUser) -> RawUser {
    RawUser {
        id: user.id.to_string(),
        name: user.name,
        real_name: user.real_name,
        display_name: user.profile.and_then(|p| p.display_name),
        deleted: user.deleted.unwrap_or(false),
        is_bot: user.flags.is_bot.unwrap_or(false),
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn list_conversations(&self, query: &ConversationsQuery) -> Result<ConversationPage> {
        let session = self.client.open_session(&self.token);

        let mut request = SlackApiConversationsListRequest::new()
            .with_types(query.types.iter().copied().map(to_morphism_type).collect());
        request.limit = Some(query.limit);
        request.exclude_archived = Some(query.exclude_archived);
        request.cursor = query.cursor.clone().map(SlackCursorId);

        let response = self
            .call("conversations.list", session.conversations_list(&request))
            .await?;

        let next_cursor = response
            .response_metadata
            .and_then(|m| m.next_cursor)
            .map(|c| c.to_string());

        Ok(ConversationPage {
            channels: response.channels.into_iter().map(to_raw_channel).collect(),
            next_cursor,
        })
    }

    async fn list_users(&self) -> Result<Vec<RawUser>> {
        let session = self.client.open_session(&self.token);

        let request = SlackApiUsersListRequest::new();
        let response = self.call("users.list", session.users_list(&request)).await?;

        Ok(response.members.into_iter().map(to_raw_user).collect())
    }

    async fn auth_test(&self) -> Result<BotIdentity> {
        let session = self.client.open_session(&self.token);

        let response = self.call("auth.test", session.auth_test()).await?;

        Ok(BotIdentity {
            user_id: response.user_id.to_string(),
            team_id: response.team_id.to_string(),
            user: response.user,
            team: Some(response.team),
            bot_id: response.bot_id.map(|id| id.to_string()),
        })
    }

    async fn post_message(&self, message: &OutgoingMessage) -> Result<MessageTs> {
        let session = self.client.open_session(&self.token);

        let mut request = SlackApiChatPostMessageRequest::new(
            message.channel.as_str().into(),
            SlackMessageContent::new().with_text(message.text.clone()),
        );
        request.username = message.username.clone();
        request.unfurl_links = Some(false);
        request.unfurl_media = Some(false);

        let response = self
            .call("chat.postMessage", session.chat_post_message(&request))
            .await?;

        Ok(MessageTs::new(response.ts.to_string()))
    }
}
