//! inspectd — inspector appointment scheduling served over the
//! Postgres wire protocol.
//!
//! Recurring weekly availability, blackout exclusions, buffer times,
//! per-day caps, and an advance-booking horizon feed a pure slot
//! computation; booking commits re-run the conflict check under a
//! per-inspector write lock so concurrent requests can never
//! double-book. State is per-tenant, held in memory, and made durable
//! through an append-only WAL.

pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod sql;
pub mod tenant;
pub mod tls;
pub mod wal;
pub mod wire;

mod auth;
mod compactor;
