//! Normalize raw channel and user records into one directory

use crate::config::UsersFailurePolicy;
use crate::directory::paginator::PaginationOutcome;
use crate::directory::{Destination, DestinationKind, Directory};
use crate::error::{BroadcasterError, Result};
use crate::slack::{RawChannel, RawUser};

/// Slackbot's fixed user id; it cannot receive broadcasts
pub const SYSTEM_USER_ID: &str = "USLACKBOT";

/// A user destination is a conversation between the bot and that user
pub const USER_MEMBER_COUNT: u64 = 2;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// IM wins over multi-party IM. Privacy is not a kind of its own: a private
/// channel collapses into `Channel` and carries `is_private` instead.
pub fn channel_kind(raw: &RawChannel) -> DestinationKind {
    if raw.is_im {
        DestinationKind::DirectMessage
    } else if raw.is_mpim {
        DestinationKind::Group
    } else {
        DestinationKind::Channel
    }
}

pub fn channel_destination(raw: RawChannel) -> Destination {
    let kind = channel_kind(&raw);
    let display_name = non_empty(raw.name).unwrap_or_else(|| format!("Channel {}", raw.id));

    Destination {
        id: raw.id,
        display_name,
        secondary_label: None,
        kind,
        is_private: raw.is_private,
        is_archived: raw.is_archived,
        member_count: raw.num_members,
    }
}

/// Deleted users, bots and Slackbot can't be addressed
pub fn is_addressable(user: &RawUser) -> bool {
    !user.deleted && !user.is_bot && user.id != SYSTEM_USER_ID
}

pub fn user_destination(raw: RawUser) -> Option<Destination> {
    if !is_addressable(&raw) {
        return None;
    }

    let handle = non_empty(raw.name);
    let display_name = non_empty(raw.real_name)
        .or_else(|| handle.clone())
        .unwrap_or_else(|| raw.id.clone());
    let secondary_label = non_empty(raw.display_name).or(handle);

    Some(Destination {
        id: raw.id,
        display_name,
        secondary_label,
        kind: DestinationKind::User,
        is_private: true,
        is_archived: false,
        member_count: Some(USER_MEMBER_COUNT),
    })
}

/// Channels first, then addressable users, each in upstream order
pub fn merge(channels: Vec<RawChannel>, users: Vec<RawUser>) -> Directory {
    let mut destinations: Vec<Destination> = Vec::with_capacity(channels.len() + users.len());
    destinations.extend(channels.into_iter().map(channel_destination));
    destinations.extend(users.into_iter().filter_map(user_destination));
    Directory::new(destinations)
}

/// Combine the outcome of both fetches into a directory or one aggregated error.
///
/// - no channels because pagination failed: error, with the users failure if any
/// - no channels and users failed: error listing both
/// - channels fine, users failed: decided by `policy`
pub fn reconcile(
    pagination: PaginationOutcome,
    users: Result<Vec<RawUser>>,
    policy: UsersFailurePolicy,
) -> Result<Directory> {
    let PaginationOutcome {
        channels,
        stopped_by,
        ..
    } = pagination;

    let channel_failure = if channels.is_empty() {
        stopped_by.map(|e| e.detail())
    } else {
        None
    };

    match users {
        Ok(users) => match channel_failure {
            Some(reason) => Err(BroadcasterError::DirectoryFetch {
                channels: Some(reason),
                users: None,
            }),
            None => Ok(merge(channels, users)),
        },
        Err(user_error) if channels.is_empty() => Err(BroadcasterError::DirectoryFetch {
            channels: Some(channel_failure.unwrap_or_else(|| "No channels returned".to_string())),
            users: Some(user_error.detail()),
        }),
        Err(user_error) => match policy {
            UsersFailurePolicy::Fail => Err(BroadcasterError::DirectoryFetch {
                channels: None,
                users: Some(user_error.detail()),
            }),
            UsersFailurePolicy::ChannelsOnly => {
                tracing::warn!(
                    channels = channels.len(),
                    error = %user_error,
                    "users.list failed, serving channels only"
                );
                Ok(merge(channels, Vec::new()))
            }
        },
    }
}
