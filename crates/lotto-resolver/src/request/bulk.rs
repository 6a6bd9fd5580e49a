use std::{collections::BTreeMap, sync::Arc};

use lotto_draw::{Draw, DrawRecord};
use serde::Deserialize;

use super::{
    Upstream,
    lenient::{Lenient, int},
};
use crate::{cache::TtlCache, error::SourceError};

pub type DrawMap = BTreeMap<u32, Draw>;

#[derive(Debug, Deserialize)]
struct BulkEnvelope {
    result: Option<BulkResult>,
}

#[derive(Debug, Deserialize)]
struct BulkResult {
    #[serde(rename = "pstLtEpsdInfo", default)]
    episodes: Vec<BulkRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRow {
    lt_epsd: Option<Lenient>,
    tm1_wn_no: Option<Lenient>,
    tm2_wn_no: Option<Lenient>,
    tm3_wn_no: Option<Lenient>,
    tm4_wn_no: Option<Lenient>,
    tm5_wn_no: Option<Lenient>,
    tm6_wn_no: Option<Lenient>,
    bns_wn_no: Option<Lenient>,
    lt_rfl_ymd: Option<Lenient>,
    rnk1_wn_amt: Option<Lenient>,
}

impl BulkRow {
    fn into_draw(self) -> Result<Draw, SourceError> {
        let draw_no = int(self.lt_epsd.as_ref()).ok_or_else(|| SourceError::parse("episode"))?;
        let numbers = [
            &self.tm1_wn_no,
            &self.tm2_wn_no,
            &self.tm3_wn_no,
            &self.tm4_wn_no,
            &self.tm5_wn_no,
            &self.tm6_wn_no,
        ]
        .into_iter()
        .map(|value| int(value.as_ref()).ok_or_else(|| SourceError::parse("winning number")))
        .collect::<Result<Vec<_>, _>>()?;
        let bonus = int(self.bns_wn_no.as_ref()).ok_or_else(|| SourceError::parse("bonus"))?;
        let draw_date = self
            .lt_rfl_ymd
            .as_ref()
            .map(Lenient::as_text)
            .and_then(|ymd| compact_to_iso(&ymd))
            .ok_or_else(|| SourceError::parse("draw date"))?;

        let record = DrawRecord {
            draw_no,
            draw_date,
            numbers,
            bonus,
            first_prize_amount: int(self.rnk1_wn_amt.as_ref()).unwrap_or(0),
        };
        Ok(Draw::try_from(record)?)
    }
}

/// `YYYYMMDD` to `YYYY-MM-DD`.
fn compact_to_iso(ymd: &str) -> Option<String> {
    if ymd.len() != 8 || !ymd.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &ymd[..4], &ymd[4..6], &ymd[6..]))
}

/// Parses the bulk listing into a map keyed by draw number.
///
/// Rows that fail validation are dropped. A payload without the
/// `result` object is an error.
pub fn parse_bulk_payload(body: &str) -> Result<DrawMap, SourceError> {
    let envelope: BulkEnvelope =
        serde_json::from_str(body).map_err(|e| SourceError::parse(format!("bulk json: {e}")))?;
    let result = envelope
        .result
        .ok_or_else(|| SourceError::parse("bulk payload has no result"))?;

    let mut draws = DrawMap::new();
    for row in result.episodes {
        match row.into_draw() {
            Ok(draw) => {
                draws.insert(draw.draw_no(), draw);
            }
            Err(e) => log::debug!("Dropping bulk row: {e}"),
        }
    }
    Ok(draws)
}

/// Bulk listing of every published draw, cached for a short TTL.
pub struct BulkSource {
    upstream: Upstream,
    url: String,
    cache: TtlCache<(), Arc<DrawMap>>,
}

impl BulkSource {
    pub fn new(upstream: Upstream, url: impl Into<String>, cache: TtlCache<(), Arc<DrawMap>>) -> Self {
        Self {
            upstream,
            url: url.into(),
            cache,
        }
    }

    /// Fresh map, re-fetched when the TTL elapsed or `force` is set.
    ///
    /// A failed fetch re-stamps the last good map (or an empty one) so the
    /// listing is not requested again until one TTL has passed.
    pub async fn refresh(&self, force: bool) -> Result<Arc<DrawMap>, SourceError> {
        if !force {
            if let Some(map) = self.cache.get_fresh(&()).await {
                return Ok(map);
            }
        }

        match self.fetch().await {
            Ok(map) => {
                log::debug!("Bulk listing refreshed with {} draws", map.len());
                self.cache.insert((), Arc::clone(&map)).await;
                Ok(map)
            }
            Err(e) => {
                let fallback = self.cache.get_stale(&()).await.unwrap_or_default();
                self.cache.insert((), fallback).await;
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Arc<DrawMap>, SourceError> {
        let body = self.upstream.get_text(&self.url).await?;
        Ok(Arc::new(parse_bulk_payload(&body)?))
    }

    /// Best available map: fresh if possible, the last good one if the
    /// refresh failed, empty if there never was one.
    pub async fn snapshot(&self) -> Arc<DrawMap> {
        match self.refresh(false).await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Bulk refresh failed: {e}");
                self.cache.get_stale(&()).await.unwrap_or_default()
            }
        }
    }

    /// Highest draw number in a forced refresh of the listing.
    pub async fn latest_draw_no(&self) -> Result<Option<u32>, SourceError> {
        let map = self.refresh(true).await?;
        Ok(map.last_key_value().map(|(&draw_no, _)| draw_no))
    }
}
