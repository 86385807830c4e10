//! Append-only audit sink.
//!
//! Components emit [`AuditEvent`]s through an [`AuditHandle`]; a single
//! [`AuditWriter`] task logs each event and persists it to an [`AuditStore`].

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
