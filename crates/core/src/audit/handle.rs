use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::AuditEvent;

/// Envelope wrapping an audit event with metadata
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Handle for emitting audit events.
///
/// Cheap to clone and shared by every job. Events travel over a bounded
/// channel to the [`AuditWriter`](super::AuditWriter); a closed or full
/// channel is logged, never surfaced to the emitter.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an audit event, waiting for channel capacity.
    pub async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.tx.send(AuditEventEnvelope::now(event)).await {
            tracing::error!("Failed to emit audit event: {}", e);
        }
    }

    /// Emit without waiting. Returns false if the event was dropped.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        match self.tx.try_send(AuditEventEnvelope::now(event)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit audit event: {}", e);
                false
            }
        }
    }
}

/// Emit through an optional handle.
pub async fn emit_opt(audit: &Option<AuditHandle>, event: AuditEvent) {
    if let Some(handle) = audit {
        handle.emit(event).await;
    }
}
