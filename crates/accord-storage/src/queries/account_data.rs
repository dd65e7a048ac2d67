// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account data table operations.
//!
//! Writes go through the database's [`SerializedWriter`](crate::writer::SerializedWriter);
//! reads run on the reader pool. Statements are prepared once per
//! connection through rusqlite's statement cache.

use accord_core::{AccordError, AccountData, JsonContent, Localpart, RequestContext, RoomScope};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

const UPSERT_ACCOUNT_DATA_SQL: &str = "INSERT INTO account_data (localpart, room_id, type, content)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (localpart, room_id, type) DO UPDATE SET content = excluded.content";

const SELECT_ACCOUNT_DATA_SQL: &str =
    "SELECT room_id, type, content FROM account_data WHERE localpart = ?1";

const SELECT_ACCOUNT_DATA_BY_TYPE_SQL: &str =
    "SELECT content FROM account_data WHERE localpart = ?1 AND room_id = ?2 AND type = ?3";

/// Insert or replace one document. Runs on whatever connection or
/// transaction it is given; callers outside this module go through
/// [`upsert_account_data`].
pub fn upsert(
    conn: &rusqlite::Connection,
    localpart: &str,
    room_id: &str,
    data_type: &str,
    content: &str,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(UPSERT_ACCOUNT_DATA_SQL)?;
    stmt.execute(params![localpart, room_id, data_type, content])?;
    Ok(())
}

/// Insert or replace the content for (localpart, room, data_type) through
/// the serialized writer.
pub async fn upsert_account_data(
    db: &Database,
    ctx: &RequestContext,
    localpart: &Localpart,
    room: &RoomScope,
    data_type: &str,
    content: &JsonContent,
) -> Result<(), AccordError> {
    let localpart = localpart.as_str().to_string();
    let room_id = room.as_column().to_string();
    let data_type = data_type.to_string();
    let content = content.as_str().to_string();
    db.writer()
        .submit(ctx, move |tx| {
            upsert(tx, &localpart, &room_id, &data_type, &content).map_err(AccordError::storage)
        })
        .await
}

/// Every document of a user, grouped into global and per-room maps.
pub async fn select_account_data(
    db: &Database,
    ctx: &RequestContext,
    localpart: &Localpart,
) -> Result<AccountData, AccordError> {
    let localpart = localpart.as_str().to_string();
    db.readers()
        .read(ctx, move |conn| {
            let mut stmt = conn.prepare_cached(SELECT_ACCOUNT_DATA_SQL)?;
            let rows = stmt.query_map(params![localpart], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut data = AccountData::new();
            for row in rows {
                let (room_id, data_type, content) = row?;
                data.insert(
                    RoomScope::from_column(room_id),
                    data_type,
                    JsonContent::from(content),
                );
            }
            Ok(data)
        })
        .await
}

/// Content for an exact (localpart, room, data_type). `None` if absent.
pub async fn select_account_data_by_type(
    db: &Database,
    ctx: &RequestContext,
    localpart: &Localpart,
    room: &RoomScope,
    data_type: &str,
) -> Result<Option<JsonContent>, AccordError> {
    let localpart = localpart.as_str().to_string();
    let room_id = room.as_column().to_string();
    let data_type = data_type.to_string();
    db.readers()
        .read(ctx, move |conn| {
            let mut stmt = conn.prepare_cached(SELECT_ACCOUNT_DATA_BY_TYPE_SQL)?;
            let content = stmt
                .query_row(params![localpart, room_id, data_type], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(content.map(JsonContent::from))
        })
        .await
}
