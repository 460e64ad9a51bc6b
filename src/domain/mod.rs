//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep DTO/report structs in one place.
//! - Avoid cyclic imports and duplicated type definitions.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — session, application records, feed snapshots, actions, reports.
//! - `constants.rs` — stable defaults (API base URL, refresh cadence, file names).
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! Record, stats and action structs mirror the backend wire format. The report
//! structs shape `--json` outputs; keep them synchronized with `docs/contracts/*`.

pub mod constants;
pub mod models;
