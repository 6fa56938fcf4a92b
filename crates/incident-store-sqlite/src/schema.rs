//! SQL schema for the incidentd SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS incidents (
    incident_id  TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    severity     TEXT NOT NULL,   -- 'Critical' | 'High' | 'Medium' | 'Low'
    status       TEXT NOT NULL,   -- 'Open' | 'In Progress' | 'Mitigated' | 'Resolved' | 'Closed'
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    resolved_at  TEXT             -- written once, never cleared
);

-- No foreign key to incidents: deleting an incident leaves its events.
-- rowid is the insertion-order tie-breaker for equal timestamps.
CREATE TABLE IF NOT EXISTS timeline_events (
    event_id     TEXT PRIMARY KEY,
    incident_id  TEXT NOT NULL,
    event_type   TEXT NOT NULL,
    description  TEXT NOT NULL,
    occurred_at  TEXT NOT NULL,
    author       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS postmortems (
    postmortem_id        TEXT PRIMARY KEY,
    incident_id          TEXT NOT NULL,
    root_cause           TEXT NOT NULL DEFAULT '',
    contributing_factors TEXT NOT NULL DEFAULT '[]',  -- JSON array, set semantics
    impact               TEXT NOT NULL DEFAULT '',
    action_items         TEXT NOT NULL DEFAULT '[]',  -- JSON array, ordered
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    UNIQUE (incident_id)
);

CREATE INDEX IF NOT EXISTS incidents_status_idx   ON incidents(status);
CREATE INDEX IF NOT EXISTS incidents_severity_idx ON incidents(severity);
CREATE INDEX IF NOT EXISTS timeline_incident_idx  ON timeline_events(incident_id, occurred_at);

PRAGMA user_version = 1;
";
