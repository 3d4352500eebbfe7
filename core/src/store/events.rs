use super::WorldStore;
use crate::{
    error::StateResult,
    event::{EventLogEntry, StateEvent},
};
use rusqlite::params;

impl WorldStore {
    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, event: &StateEvent) -> StateResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (event_type, payload) VALUES (?1, ?2)",
            params![event.kind(), serde_json::to_string(event)?],
        )?;
        Ok(())
    }

    pub fn events(&self) -> StateResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, payload FROM event_log ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    event_type: row.get(1)?,
                    payload:    row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of logged events of one kind (for tests and summaries).
    pub fn event_count(&self, event_type: &str) -> StateResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
