use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub const KEY_LATEST_DRAW_NO: &str = "latest_draw_no";
pub const KEY_LAST_SYNC_AT: &str = "last_sync_at";

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::models::schema::sync_meta)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

impl MetaEntry {
    pub fn new(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_string(),
        }
    }
}

/// Outcome of the last sync that brought in at least one draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// 0 when nothing was ever synced.
    pub local_latest_draw_no: u32,
    /// Epoch millis.
    pub last_sync_at: Option<i64>,
}

impl SyncState {
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at.and_then(DateTime::from_timestamp_millis)
    }
}
