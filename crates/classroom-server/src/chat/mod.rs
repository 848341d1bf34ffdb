//! Class chat relay
//!
//! Poll-based: clients POST messages and GET everything newer than the last
//! date they saw.

pub mod handlers;
pub mod store;

pub use store::{parse_since, ChatMessage, ChatStore, BACKLOG_CAPACITY};
