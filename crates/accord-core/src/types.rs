// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store facade, the table layer, and callers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AccordError;

/// The local part of a user's account identifier.
///
/// Opaque to the store beyond being a stable, non-empty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Localpart(String);

impl Localpart {
    /// Create a localpart, rejecting the empty string.
    pub fn new(localpart: impl Into<String>) -> Result<Self, AccordError> {
        let localpart = localpart.into();
        if localpart.is_empty() {
            return Err(AccordError::Validation(
                "localpart must not be empty".to_string(),
            ));
        }
        Ok(Self(localpart))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Localpart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Localpart {
    type Err = AccordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Localpart {
    type Error = AccordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Localpart> for String {
    fn from(value: Localpart) -> Self {
        value.0
    }
}

/// Identifier of a room. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(room_id: impl Into<String>) -> Result<Self, AccordError> {
        let room_id = room_id.into();
        if room_id.is_empty() {
            return Err(AccordError::Validation(
                "room id must not be empty".to_string(),
            ));
        }
        Ok(Self(room_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a piece of account data applies: to the account as a whole, or to
/// a single room.
///
/// The table stores global scope as an empty `room_id`. That sentinel never
/// leaves the storage layer, and [`RoomId`] cannot be empty, so a real room
/// can never be mistaken for the global scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RoomScope {
    #[default]
    Global,
    Room(RoomId),
}

impl RoomScope {
    /// Room scope for the given room id.
    pub fn room(room_id: impl Into<String>) -> Result<Self, AccordError> {
        RoomId::new(room_id).map(Self::Room)
    }

    /// `None` is the global scope. `Some("")` is rejected.
    pub fn from_optional(room_id: Option<&str>) -> Result<Self, AccordError> {
        match room_id {
            None => Ok(Self::Global),
            Some(id) => Self::room(id),
        }
    }

    /// Value written to the `room_id` column.
    pub fn as_column(&self) -> &str {
        match self {
            Self::Global => "",
            Self::Room(id) => id.as_str(),
        }
    }

    /// Inverse of [`RoomScope::as_column`].
    pub fn from_column(room_id: String) -> Self {
        if room_id.is_empty() {
            Self::Global
        } else {
            Self::Room(RoomId(room_id))
        }
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::Global => None,
            Self::Room(id) => Some(id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl fmt::Display for RoomScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Room(id) => write!(f, "room {id}"),
        }
    }
}

/// An opaque JSON document, stored and returned verbatim.
///
/// The store never parses content. [`JsonContent::parse`] and
/// [`JsonContent::from_value`] exist for callers that want typed access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonContent(String);

impl JsonContent {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Serialize a value into JSON content.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, AccordError> {
        Ok(Self(serde_json::to_string(value)?))
    }

    /// Deserialize the content into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AccordError> {
        Ok(serde_json::from_str(&self.0)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Empty or whitespace-only content.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for JsonContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JsonContent {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JsonContent {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One stored row: a typed document for a user, in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDataRecord {
    pub localpart: Localpart,
    pub room: RoomScope,
    pub data_type: String,
    pub content: JsonContent,
}

/// A map from account data type to content.
pub type TypedContent = BTreeMap<String, JsonContent>;

/// All account data of one user, split by scope.
///
/// Every record lands in exactly one of the two maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountData {
    /// Type -> content for global records.
    pub global: TypedContent,
    /// Room id -> (type -> content) for room-scoped records.
    pub rooms: BTreeMap<String, TypedContent>,
}

impl AccountData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one row into the matching map.
    pub fn insert(&mut self, room: RoomScope, data_type: String, content: JsonContent) {
        match room {
            RoomScope::Global => {
                self.global.insert(data_type, content);
            }
            RoomScope::Room(id) => {
                self.rooms
                    .entry(id.0)
                    .or_default()
                    .insert(data_type, content);
            }
        }
    }

    /// Content for one type in one scope.
    pub fn get(&self, room: &RoomScope, data_type: &str) -> Option<&JsonContent> {
        match room {
            RoomScope::Global => self.global.get(data_type),
            RoomScope::Room(id) => self.rooms.get(id.as_str())?.get(data_type),
        }
    }

    /// Total number of records across both maps.
    pub fn len(&self) -> usize {
        self.global.len() + self.rooms.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rooms holding at least one record, in sorted order.
    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }
}

impl FromIterator<AccountDataRecord> for AccountData {
    fn from_iter<I: IntoIterator<Item = AccountDataRecord>>(iter: I) -> Self {
        let mut data = Self::new();
        for record in iter {
            data.insert(record.room, record.data_type, record.content);
        }
        data
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn record(room: RoomScope, data_type: &str, content: &str) -> AccountDataRecord {
        AccountDataRecord {
            localpart: Localpart::new("alice").unwrap(),
            room,
            data_type: data_type.to_string(),
            content: JsonContent::from(content),
        }
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(Localpart::new("").unwrap_err().is_validation());
        assert!(RoomScope::room("").unwrap_err().is_validation());
        assert!(RoomScope::from_optional(Some("")).is_err());
        assert_eq!(RoomScope::from_optional(None).unwrap(), RoomScope::Global);
    }

    #[test]
    fn global_sentinel_maps_both_ways() {
        assert_eq!(RoomScope::Global.as_column(), "");
        assert_eq!(RoomScope::from_column(String::new()), RoomScope::Global);

        let room = RoomScope::room("!room1").unwrap();
        assert_eq!(room.as_column(), "!room1");
        assert_eq!(RoomScope::from_column("!room1".to_string()), room);
        assert_eq!(room.room_id().map(RoomId::as_str), Some("!room1"));
    }

    #[test]
    fn localpart_deserialization_validates() {
        let ok: Localpart = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<Localpart>("\"\"").is_err());
    }

    #[test]
    fn json_content_typed_helpers() {
        let content = JsonContent::from_value(&serde_json::json!({"enabled": true})).unwrap();
        assert_eq!(content.as_str(), r#"{"enabled":true}"#);

        let value: serde_json::Value = content.parse().unwrap();
        assert_eq!(value["enabled"], true);

        assert!(JsonContent::from("  \n").is_blank());
        assert!(JsonContent::from("not json").parse::<serde_json::Value>().is_err());
    }

    #[test]
    fn rows_split_into_global_and_rooms() {
        let data: AccountData = vec![
            record(RoomScope::Global, "m.push_rules", r#"{"enabled":true}"#),
            record(RoomScope::room("!room1").unwrap(), "m.tag", r#"{"favourite":{}}"#),
        ]
        .into_iter()
        .collect();

        assert_eq!(data.global.len(), 1);
        assert_eq!(
            data.global["m.push_rules"].as_str(),
            r#"{"enabled":true}"#
        );
        assert_eq!(data.rooms.len(), 1);
        assert_eq!(
            data.rooms["!room1"]["m.tag"].as_str(),
            r#"{"favourite":{}}"#
        );
        assert_eq!(data.len(), 2);
        assert_eq!(data.room_ids().collect::<Vec<_>>(), vec!["!room1"]);
    }

    #[test]
    fn empty_rows_give_empty_maps() {
        let data: AccountData = std::iter::empty().collect();
        assert!(data.global.is_empty());
        assert!(data.rooms.is_empty());
        assert!(data.is_empty());
    }

    proptest! {
        #[test]
        fn grouping_accounts_for_every_record(
            global_types in prop::collection::btree_set("[a-z]{1,8}", 0..8),
            room_entries in prop::collection::btree_set(("![a-z]{1,4}", "[a-z]{1,8}"), 0..16),
        ) {
            let mut records: Vec<AccountDataRecord> = global_types
                .iter()
                .map(|t| record(RoomScope::Global, t, "{}"))
                .collect();
            records.extend(room_entries.iter().map(|(room, t)| {
                record(RoomScope::room(room.clone()).unwrap(), t, "[]")
            }));

            let data: AccountData = records.into_iter().collect();

            let distinct_rooms: BTreeSet<&String> = room_entries.iter().map(|(r, _)| r).collect();
            prop_assert_eq!(data.global.len(), global_types.len());
            prop_assert_eq!(data.rooms.len(), distinct_rooms.len());
            prop_assert_eq!(
                data.rooms.values().map(BTreeMap::len).sum::<usize>(),
                room_entries.len()
            );
            for (room, t) in &room_entries {
                let scope = RoomScope::room(room.clone()).unwrap();
                prop_assert!(data.get(&scope, t).is_some());
            }
        }
    }
}
