use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result};
use uuid::Uuid;

use crate::domain::Deed;

/// Insert a deed, replacing any existing row with the same id
pub fn upsert_deed(conn: &Connection, deed: &Deed) -> Result<()> {
  conn.execute(
    r#"
    INSERT OR REPLACE INTO deeds (id, name, period_secs, last)
    VALUES (?1, ?2, ?3, ?4)
    "#,
    params![
      deed.id.to_string(),
      deed.name,
      deed.period.num_seconds(),
      deed.last.to_rfc3339(),
    ],
  )?;
  Ok(())
}

/// Mark a deed as done now. Returns the new timestamp, or None if no such deed.
pub fn touch_deed(conn: &Connection, id: &Uuid) -> Result<Option<DateTime<Utc>>> {
  let now = Utc::now();
  let changed = conn.execute(
    "UPDATE deeds SET last = ?1 WHERE id = ?2",
    params![now.to_rfc3339(), id.to_string()],
  )?;
  Ok((changed > 0).then_some(now))
}

/// Delete a deed. Returns whether a row was removed.
pub fn delete_deed(conn: &Connection, id: &Uuid) -> Result<bool> {
  let changed = conn.execute("DELETE FROM deeds WHERE id = ?1", params![id.to_string()])?;
  Ok(changed > 0)
}

pub fn get_deed(conn: &Connection, id: &Uuid) -> Result<Option<Deed>> {
  conn
    .query_row(
      "SELECT id, name, period_secs, last FROM deeds WHERE id = ?1",
      params![id.to_string()],
      row_to_deed,
    )
    .optional()
}

/// All deeds ordered by name
pub fn list_deeds(conn: &Connection) -> Result<Vec<Deed>> {
  let mut stmt = conn.prepare("SELECT id, name, period_secs, last FROM deeds ORDER BY name")?;
  let deeds = stmt
    .query_map([], row_to_deed)?
    .collect::<Result<Vec<_>>>()?;
  Ok(deeds)
}

fn row_to_deed(row: &rusqlite::Row) -> Result<Deed> {
  let id_str: String = row.get(0)?;
  let last_str: String = row.get(3)?;

  Ok(Deed {
    id: Uuid::parse_str(&id_str)
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
    name: row.get(1)?,
    period: Duration::seconds(row.get(2)?),
    last: DateTime::parse_from_rfc3339(&last_str)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
  })
}
