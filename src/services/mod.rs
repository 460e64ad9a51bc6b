//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `session.rs` — the session store: current identity + change notifications.
//! - `storage.rs` — durable token/role persistence behind the session store.
//! - `policy.rs` — capability gate and the view → requirement table.
//! - `navigation.rs` — navigation model that follows session changes.
//! - `api.rs` — backend REST client.
//! - `feed.rs` — live feed synchronizer (polling, search, stale-response rule).
//! - `dispatch.rs` — action dispatcher (submit, then force a feed refresh).
//! - `config.rs` — config file + environment overrides.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod feed;
pub mod navigation;
pub mod output;
pub mod policy;
pub mod session;
pub mod storage;
