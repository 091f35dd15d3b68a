//! Scripted in-memory Slack API used by unit tests

use crate::error::{BroadcasterError, Result};
use crate::slack::{
    BotIdentity, ConversationPage, ConversationsQuery, MessageTs, OutgoingMessage, RawChannel,
    RawUser, SlackApi,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeSlack {
    pages: Mutex<VecDeque<Result<ConversationPage>>>,
    users: Mutex<Option<Result<Vec<RawUser>>>>,
    post_failures: HashMap<String, String>,
    pub queries: Mutex<Vec<ConversationsQuery>>,
    pub posted: Mutex<Vec<OutgoingMessage>>,
    pub conversation_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page response; the cursor is passed through as given
    pub fn with_page(self, channels: Vec<RawChannel>, next_cursor: Option<&str>) -> Self {
        self.pages.lock().unwrap().push_back(Ok(ConversationPage {
            channels,
            next_cursor: next_cursor.map(str::to_string),
        }));
        self
    }

    pub fn with_page_error(self, error: BroadcasterError) -> Self {
        self.pages.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_users(self, users: Vec<RawUser>) -> Self {
        *self.users.lock().unwrap() = Some(Ok(users));
        self
    }

    pub fn with_users_error(self, error: BroadcasterError) -> Self {
        *self.users.lock().unwrap() = Some(Err(error));
        self
    }

    pub fn failing_post(mut self, channel: &str, error: &str) -> Self {
        self.post_failures
            .insert(channel.to_string(), error.to_string());
        self
    }

    pub fn conversation_calls(&self) -> usize {
        self.conversation_calls.load(Ordering::SeqCst)
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }
}

/// Clone a scripted result; errors keep their variant and message
fn replay<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v.clone()),
        Err(BroadcasterError::UpstreamRejected(m)) => Err(BroadcasterError::UpstreamRejected(m.clone())),
        Err(BroadcasterError::UpstreamUnavailable(m)) => {
            Err(BroadcasterError::UpstreamUnavailable(m.clone()))
        }
        Err(other) => Err(BroadcasterError::Internal(other.to_string())),
    }
}

pub fn channel(id: &str, name: &str) -> RawChannel {
    RawChannel {
        id: id.to_string(),
        name: Some(name.to_string()),
        num_members: Some(3),
        ..Default::default()
    }
}

pub fn user(id: &str, name: &str, real_name: Option<&str>) -> RawUser {
    RawUser {
        id: id.to_string(),
        name: Some(name.to_string()),
        real_name: real_name.map(str::to_string),
        ..Default::default()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn list_conversations(&self, query: &ConversationsQuery) -> Result<ConversationPage> {
        self.conversation_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ConversationPage::default()))
    }

    async fn list_users(&self) -> Result<Vec<RawUser>> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        match self.users.lock().unwrap().as_ref() {
            Some(result) => replay(result),
            None => Ok(Vec::new()),
        }
    }

    async fn auth_test(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            user_id: "UBOT".to_string(),
            team_id: "T1".to_string(),
            user: Some("broadcaster".to_string()),
            team: Some("Acme".to_string()),
            bot_id: Some("B1".to_string()),
        })
    }

    async fn post_message(&self, message: &OutgoingMessage) -> Result<MessageTs> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.posted.lock().unwrap().push(message.clone());
        match self.post_failures.get(message.channel.as_str()) {
            Some(error) => Err(BroadcasterError::UpstreamRejected(error.clone())),
            None => Ok(MessageTs::new("1700000000.000100")),
        }
    }
}
