use diesel::prelude::*;

use super::Datastore;
use crate::models::schema::sync_meta;
use crate::models::sync_meta::{KEY_LAST_SYNC_AT, KEY_LATEST_DRAW_NO, MetaEntry, SyncState};

pub(crate) fn put_meta(conn: &mut SqliteConnection, key: &str, value: impl ToString) -> QueryResult<usize> {
    diesel::replace_into(sync_meta::table)
        .values(&MetaEntry::new(key, value))
        .execute(conn)
}

impl Datastore {
    pub fn meta(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.connection()?;
        sync_meta::table
            .filter(sync_meta::key.eq(key))
            .select(sync_meta::value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(|e| anyhow::anyhow!("Error reading meta {key}: {e}"))
    }

    /// Draw number and time recorded by the last productive sync.
    pub fn sync_state(&self) -> anyhow::Result<SyncState> {
        let local_latest_draw_no = self
            .meta(KEY_LATEST_DRAW_NO)?
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        let last_sync_at = self
            .meta(KEY_LAST_SYNC_AT)?
            .and_then(|value| value.parse().ok());
        Ok(SyncState {
            local_latest_draw_no,
            last_sync_at,
        })
    }
}
