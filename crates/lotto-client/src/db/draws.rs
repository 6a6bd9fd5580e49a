use diesel::dsl::max;
use diesel::prelude::*;
use lotto_draw::{BALL_MAX, Draw};

use super::Datastore;
use super::sync_meta::put_meta;
use crate::models::DrawRow;
use crate::models::schema::draws;
use crate::models::sync_meta::{KEY_LAST_SYNC_AT, KEY_LATEST_DRAW_NO};

fn into_draws(rows: Vec<DrawRow>) -> anyhow::Result<Vec<Draw>> {
    rows.into_iter()
        .map(|row| {
            let draw_no = row.draw_no;
            Draw::try_from(row).map_err(|e| anyhow::anyhow!("Stored draw {draw_no} is invalid: {e}"))
        })
        .collect()
}

impl Datastore {
    /// Upserts `draws` by draw number. When the batch is not empty the
    /// sync meta is advanced in the same transaction.
    pub fn merge_draws(&self, batch: &[Draw], now_millis: i64) -> anyhow::Result<usize> {
        let rows = batch
            .iter()
            .map(|draw| DrawRow::from_draw(draw, now_millis))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut conn = self.connection()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for row in &rows {
                diesel::replace_into(draws::table).values(row).execute(conn)?;
            }
            if let Some(latest) = batch.iter().map(Draw::draw_no).max() {
                put_meta(conn, KEY_LATEST_DRAW_NO, latest)?;
                put_meta(conn, KEY_LAST_SYNC_AT, now_millis)?;
            }
            Ok(batch.len())
        })
        .map_err(|e| anyhow::anyhow!("Error merging {} draws: {e}", batch.len()))
    }

    /// Highest stored draw number, 0 when empty.
    pub fn local_latest_draw_no(&self) -> anyhow::Result<u32> {
        let mut conn = self.connection()?;
        let latest = draws::table
            .select(max(draws::draw_no))
            .first::<Option<i32>>(&mut conn)
            .map_err(|e| anyhow::anyhow!("Error reading latest draw: {e}"))?;
        Ok(latest.and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
    }

    pub fn draw_count(&self) -> anyhow::Result<i64> {
        let mut conn = self.connection()?;
        draws::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| anyhow::anyhow!("Error counting draws: {e}"))
    }

    /// Every stored draw, ascending.
    pub fn all_draws(&self) -> anyhow::Result<Vec<Draw>> {
        let mut conn = self.connection()?;
        let rows = draws::table
            .order(draws::draw_no.asc())
            .select(DrawRow::as_select())
            .load(&mut conn)
            .map_err(|e| anyhow::anyhow!("Error loading draws: {e}"))?;
        into_draws(rows)
    }

    /// Newest `limit` draws, newest first.
    pub fn latest_draws(&self, limit: i64) -> anyhow::Result<Vec<Draw>> {
        let mut conn = self.connection()?;
        let rows = draws::table
            .order(draws::draw_no.desc())
            .limit(limit)
            .select(DrawRow::as_select())
            .load(&mut conn)
            .map_err(|e| anyhow::anyhow!("Error loading latest {limit} draws: {e}"))?;
        into_draws(rows)
    }

    pub fn draw(&self, draw_no: u32) -> anyhow::Result<Option<Draw>> {
        let mut conn = self.connection()?;
        let key = i32::try_from(draw_no)
            .map_err(|_e| anyhow::anyhow!("Draw number {draw_no} does not fit the draws key"))?;
        let row = draws::table
            .find(key)
            .select(DrawRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| anyhow::anyhow!("Error finding draw {draw_no}: {e}"))?;
        row.map(Draw::try_from)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Stored draw {draw_no} is invalid: {e}"))
    }

    /// Draws whose winning numbers contain every number in `numbers`,
    /// newest first. An empty filter matches everything.
    pub fn search_by_numbers(&self, numbers: &[u8]) -> anyhow::Result<Vec<Draw>> {
        let mut draws = self.all_draws()?;
        draws.retain(|draw| numbers.iter().all(|n| draw.numbers().contains(n)));
        draws.reverse();
        Ok(draws)
    }

    /// How often each ball 1..=45 was drawn as a winning number.
    pub fn number_frequencies(&self) -> anyhow::Result<Vec<(u8, usize)>> {
        let mut counts = vec![0_usize; usize::from(BALL_MAX) + 1];
        for draw in self.all_draws()? {
            for &n in draw.numbers() {
                counts[usize::from(n)] += 1;
            }
        }
        Ok(counts
            .into_iter()
            .enumerate()
            .skip(1)
            .filter_map(|(n, count)| Some((u8::try_from(n).ok()?, count)))
            .collect())
    }
}
