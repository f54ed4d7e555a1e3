use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS mosques (
            id             TEXT PRIMARY KEY,
            name           TEXT NOT NULL,
            address        TEXT NOT NULL DEFAULT '',
            city           TEXT NOT NULL DEFAULT '',
            state          TEXT NOT NULL DEFAULT '',
            country        TEXT NOT NULL DEFAULT '',
            latitude       REAL NOT NULL DEFAULT 0,
            longitude      REAL NOT NULL DEFAULT 0,
            school         TEXT NOT NULL DEFAULT 'Other'
                           CHECK(school IN ('Shafi''i','Hanafi','Maliki','Hanbali','Other')),
            facilities     TEXT NOT NULL DEFAULT '[]',
            contact_number TEXT,
            email          TEXT,
            website        TEXT,
            image          TEXT,
            approved       INTEGER NOT NULL DEFAULT 0,
            created_at     TEXT DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS prayer_times (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            mosque_id   TEXT NOT NULL,
            date        TEXT NOT NULL,
            fajr        TEXT NOT NULL,
            dhuhr       TEXT NOT NULL,
            asr         TEXT NOT NULL,
            maghrib     TEXT NOT NULL,
            isha        TEXT NOT NULL,
            jummah      TEXT,
            created_at  TEXT DEFAULT (datetime('now')),
            updated_at  TEXT DEFAULT (datetime('now')),
            UNIQUE(mosque_id, date)
        );

        CREATE TABLE IF NOT EXISTS announcements (
            id           TEXT PRIMARY KEY,
            mosque_id    TEXT NOT NULL,
            title        TEXT NOT NULL,
            content      TEXT NOT NULL,
            date_posted  TEXT NOT NULL,
            expiry_date  TEXT,
            kind         TEXT NOT NULL DEFAULT 'general'
                         CHECK(kind IN ('general','event','eid','ramadan')),
            event_date   TEXT,
            event_time   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_announcements_mosque
            ON announcements(mosque_id, date_posted);

        CREATE TABLE IF NOT EXISTS favorites (
            user        TEXT NOT NULL,
            mosque_id   TEXT NOT NULL,
            created_at  TEXT DEFAULT (datetime('now')),
            PRIMARY KEY (user, mosque_id)
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;

    Ok(())
}
