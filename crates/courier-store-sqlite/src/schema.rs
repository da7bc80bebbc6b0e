//! SQL schema for the Courier SQLite store.
//!
//! Executed at every connection startup. Safe under concurrent creators:
//! everything is `IF NOT EXISTS`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS messages_received (
    id          INTEGER PRIMARY KEY,
    received_at TEXT NOT NULL,     -- RFC 3339 UTC, gateway receipt time
    source      TEXT NOT NULL,
    group_id    TEXT,              -- NULL for direct messages
    content     TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'new'   -- 'new' | 'processing' | 'processed'
);

CREATE TABLE IF NOT EXISTS outgoing_messages (
    id                  INTEGER PRIMARY KEY,
    received_message_id INTEGER REFERENCES messages_received(id),
    recipient           TEXT NOT NULL,
    content             TEXT NOT NULL,
    status              TEXT NOT NULL DEFAULT 'pending',   -- 'pending' | 'sent'
    sent_at             TEXT               -- NULL iff status = 'pending'
);

CREATE INDEX IF NOT EXISTS received_status_idx ON messages_received(status);
CREATE INDEX IF NOT EXISTS outgoing_status_idx ON outgoing_messages(status);

PRAGMA user_version = 1;
";
