//! SQL schema for the Prospect SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per lead, owner-scoped. Identity columns are written once.
CREATE TABLE IF NOT EXISTS leads (
    id             TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    name           TEXT NOT NULL,
    title          TEXT NOT NULL,
    company        TEXT NOT NULL,
    location       TEXT,
    email          TEXT NOT NULL,
    linkedin_url   TEXT,
    snippet        TEXT,
    company_domain TEXT,
    image_url      TEXT,
    email_content  TEXT,            -- canonical {\"Subject Line\",\"Email Body\"} JSON
    email_raw      TEXT,            -- upstream payload as received
    email_tone     TEXT,
    email_sent     INTEGER NOT NULL DEFAULT 0,
    sent_at        TEXT,            -- ISO 8601 UTC
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    PRIMARY KEY (id, user_id),
    CHECK ((email_sent = 0 AND sent_at IS NULL)
        OR (email_sent = 1 AND sent_at IS NOT NULL AND email_content IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS leads_user_created_idx ON leads(user_id, created_at);

PRAGMA user_version = 1;
";
