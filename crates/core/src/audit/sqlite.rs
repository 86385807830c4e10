use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Open (or create) the audit table in the database at `path`.
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path).map_err(|e| AuditError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory().map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AuditError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                game_id INTEGER,
                message TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_events_game_id ON audit_events(game_id);
            CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
            "#,
        )
        .map_err(|e| AuditError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn
            .lock()
            .map_err(|_| AuditError::Database("connection mutex poisoned".to_string()))
    }

    fn build_where_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(game_id) = filter.game_id {
            conditions.push("game_id = ?");
            params.push(Box::new(game_id));
        }

        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let conn = self.lock()?;

        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, game_id, message, data) VALUES (?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.game_id,
                record.message,
                data_json,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, game_id, message, data FROM audit_events {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let id: i64 = row.get(0)?;
                let timestamp_str: String = row.get(1)?;
                let event_type: String = row.get(2)?;
                let game_id: Option<i64> = row.get(3)?;
                let message: String = row.get(4)?;
                let data_json: String = row.get(5)?;

                Ok((id, timestamp_str, event_type, game_id, message, data_json))
            })
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let (id, timestamp_str, event_type, game_id, message, data_json) =
                row_result.map_err(|e| AuditError::Database(e.to_string()))?;

            let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| AuditError::Database(format!("Invalid timestamp: {}", e)))?
                .into();

            let data: AuditEvent = serde_json::from_str(&data_json)
                .map_err(|e| AuditError::Serialization(e.to_string()))?;

            records.push(AuditRecord {
                id,
                timestamp,
                event_type,
                game_id,
                message,
                data,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event: AuditEvent) -> AuditRecord {
        AuditRecord {
            id: 0,
            timestamp: Utc::now(),
            event_type: event.event_type().to_string(),
            game_id: event.game_id(),
            message: event.message(),
            data: event,
        }
    }

    #[test]
    fn test_insert_and_query() {
        let store = SqliteAuditStore::in_memory().unwrap();

        let id = store
            .insert(&record(AuditEvent::GameStarted { game_id: 1 }))
            .unwrap();
        assert_eq!(id, 1);

        let records = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "Game 1 has started");
        assert_eq!(records[0].data, AuditEvent::GameStarted { game_id: 1 });
    }

    #[test]
    fn test_query_filters_by_game_and_type() {
        let store = SqliteAuditStore::in_memory().unwrap();
        store
            .insert(&record(AuditEvent::GameStarted { game_id: 1 }))
            .unwrap();
        store
            .insert(&record(AuditEvent::GameStarted { game_id: 2 }))
            .unwrap();
        store
            .insert(&record(AuditEvent::GameFinished { game_id: 1 }))
            .unwrap();

        let game_one = store.query(&AuditFilter::new().with_game_id(1)).unwrap();
        assert_eq!(game_one.len(), 2);
        assert_eq!(game_one[0].event_type, "game_finished");

        let started = AuditFilter::new().with_event_type("game_started");
        assert_eq!(store.count(&started).unwrap(), 2);
    }

    #[test]
    fn test_pagination() {
        let store = SqliteAuditStore::in_memory().unwrap();
        for game_id in 0..5 {
            store
                .insert(&record(AuditEvent::GameStarted { game_id }))
                .unwrap();
        }

        let page = store
            .query(&AuditFilter::new().with_limit(2).with_offset(1))
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].game_id, Some(3));
        assert_eq!(store.count(&AuditFilter::new().with_limit(2)).unwrap(), 5);
    }
}
