//! Destination and directory types served by `GET /directory`

use serde::{Deserialize, Serialize};

/// What kind of conversation a destination addresses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DestinationKind {
    Channel,
    Group,
    DirectMessage,
    User,
}

/// A single addressable target for a broadcast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Slack id (e.g. C09NU1KFXHT, D…, U…)
    pub id: String,

    /// Human-readable label; real name for users, channel name otherwise
    pub display_name: String,

    /// Users only: profile display name or handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,

    pub kind: DestinationKind,

    pub is_private: bool,

    pub is_archived: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

/// Ordered destinations, channels before users. Never mutated after it is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Directory {
    destinations: Vec<Destination>,
}

impl Directory {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    #[cfg(test)]
    fn get(&self, id: &str) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.id == id)
    }

    /// Count destinations of one kind
    pub fn count_kind(&self, kind: DestinationKind) -> usize {
        self.destinations.iter().filter(|d| d.kind == kind).count()
    }
}
