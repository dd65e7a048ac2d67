// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `accord account-data`, `accord get`, and `accord set` implementations.

use std::io::Write;

use accord_core::{AccordError, AccountDataStore, JsonContent, Localpart, RequestContext, RoomScope};

fn write_err(e: std::io::Error) -> AccordError {
    AccordError::Internal(format!("failed to write output: {e}"))
}

/// Print the rooms a user has account data in.
pub async fn run_account_data(
    store: &dyn AccountDataStore,
    localpart: &Localpart,
    out: &mut impl Write,
) -> Result<(), AccordError> {
    let data = store
        .get_account_data(&RequestContext::background(), localpart)
        .await?;
    writeln!(out, "Rooms:").map_err(write_err)?;
    for room in data.room_ids() {
        writeln!(out, "{room}").map_err(write_err)?;
    }
    Ok(())
}

/// Print the content stored for one (user, room, type), or `not found`.
pub async fn run_get(
    store: &dyn AccountDataStore,
    localpart: &Localpart,
    room: Option<&str>,
    data_type: &str,
    out: &mut impl Write,
) -> Result<(), AccordError> {
    let room = RoomScope::from_optional(room)?;
    let content = store
        .get_account_data_by_type(&RequestContext::background(), localpart, &room, data_type)
        .await?;
    let written = match content {
        Some(content) => writeln!(out, "{content}"),
        None => writeln!(out, "not found"),
    };
    written.map_err(write_err)
}

/// Store `raw` for (user, room, type). `raw` must parse as JSON; it is
/// stored exactly as given.
pub async fn run_set(
    store: &dyn AccountDataStore,
    localpart: &Localpart,
    room: Option<&str>,
    data_type: &str,
    raw: &str,
    out: &mut impl Write,
) -> Result<(), AccordError> {
    let room = RoomScope::from_optional(room)?;
    serde_json::from_str::<serde_json::Value>(raw)
        .map_err(|e| AccordError::Validation(format!("content is not valid JSON: {e}")))?;
    store
        .set_account_data(
            &RequestContext::background(),
            localpart,
            &room,
            data_type,
            &JsonContent::new(raw),
        )
        .await?;
    writeln!(out, "Stored {data_type} for {localpart} ({room})").map_err(write_err)
}
