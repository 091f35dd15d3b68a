//! Destination directory: paging, merging and caching
//!
//! - `paginator`: lazy, capped paging over `conversations.list`
//! - `merger`: raw records to destinations, channels before users
//! - `cache`: one TTL entry holding the last directory built
//! - `service`: ties the three together behind `directory()`

mod cache;
mod merger;
mod paginator;
mod service;
mod types;

pub use cache::{CacheStats, DirectoryCache};
pub use merger::{SYSTEM_USER_ID, USER_MEMBER_COUNT, is_addressable, merge, reconcile};
pub use paginator::{Page, PageQuery, PaginationOutcome, collect_conversations, conversation_pages};
pub use service::DirectoryService;
pub use types::{Destination, DestinationKind, Directory};
