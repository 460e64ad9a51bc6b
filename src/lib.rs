//! Satark client: session/role gating and the live screening feed.
//!
//! ## Layers
//! - `cli` — clap command tree.
//! - `commands` — command handlers (one per view).
//! - `domain` — data-only types shared by everything else.
//! - `services` — session store, capability gate, REST client, feed
//!   synchronizer, action dispatcher.

pub mod cli;
pub mod commands;
pub mod domain;
pub mod services;

pub use domain::models::{
    ActionCommand, ActionKind, ApplicationRecord, ApplicationStatus, FeedSnapshot, Role, Session,
    View,
};
pub use services::api::{ApiClient, ApiError};
pub use services::dispatch::{ActionDispatcher, ActionSink, FeedRefresh};
pub use services::feed::{FeedConfig, FeedMode, FeedPage, FeedQuery, FeedSource, FeedSynchronizer};
pub use services::policy::{authorize, Decision, Route};
pub use services::session::{SessionStore, Subscription};
