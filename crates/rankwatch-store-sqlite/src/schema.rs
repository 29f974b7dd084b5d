//! SQL schema for the Rankwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sites (
    site_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    domain      TEXT NOT NULL,
    name        TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keywords (
    keyword_id  TEXT PRIMARY KEY,
    site_id     TEXT NOT NULL REFERENCES sites(site_id),
    keyword     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Observations are strictly append-only.
-- keyword_id has no foreign key so history survives keyword deletion.
-- NULL rank means the domain was absent from the result window.
CREATE TABLE IF NOT EXISTS rank_observations (
    observation_id  TEXT PRIMARY KEY,
    keyword_id      TEXT NOT NULL,
    rank            INTEGER CHECK (rank IS NULL OR rank > 0),
    observed_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sites_user_idx          ON sites(user_id);
CREATE INDEX IF NOT EXISTS keywords_site_idx       ON keywords(site_id);
CREATE INDEX IF NOT EXISTS observations_keyword_idx
    ON rank_observations(keyword_id, observed_at);

PRAGMA user_version = 1;
";
