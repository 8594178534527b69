use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS deeds (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      period_secs INTEGER NOT NULL,
      -- RFC 3339, UTC
      last TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_deeds_name ON deeds(name);
    "#,
  )
}
