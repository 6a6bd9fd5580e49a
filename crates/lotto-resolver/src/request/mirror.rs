use lotto_draw::{Draw, DrawRecord};
use serde::Deserialize;

use super::{
    Upstream, draw_url,
    lenient::{Lenient, int},
    provider::{DrawSource, UpstreamKind},
};
use crate::error::SourceError;

const SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct MirrorEnvelope {
    #[serde(rename = "returnValue")]
    return_value: Option<String>,
    #[serde(rename = "drwNo")]
    draw_no: Option<Lenient>,
    #[serde(rename = "drwNoDate")]
    draw_date: Option<String>,
    #[serde(rename = "drwtNo1")]
    n1: Option<Lenient>,
    #[serde(rename = "drwtNo2")]
    n2: Option<Lenient>,
    #[serde(rename = "drwtNo3")]
    n3: Option<Lenient>,
    #[serde(rename = "drwtNo4")]
    n4: Option<Lenient>,
    #[serde(rename = "drwtNo5")]
    n5: Option<Lenient>,
    #[serde(rename = "drwtNo6")]
    n6: Option<Lenient>,
    #[serde(rename = "bnusNo")]
    bonus: Option<Lenient>,
    #[serde(rename = "firstWinamnt")]
    first_prize_amount: Option<Lenient>,
}

/// Parses a single-draw JSON envelope for `draw_no`.
///
/// Anything other than a successful envelope describing exactly the
/// requested draw is rejected.
pub fn parse_mirror_envelope(draw_no: u32, body: &str) -> Result<Draw, SourceError> {
    let body = body.trim();
    if !body.starts_with('{') {
        return Err(SourceError::parse("mirror answered with a non-JSON body"));
    }
    let envelope: MirrorEnvelope =
        serde_json::from_str(body).map_err(|e| SourceError::parse(format!("mirror json: {e}")))?;

    if envelope.return_value.as_deref() != Some(SUCCESS) {
        return Err(SourceError::parse(format!(
            "mirror returnValue {:?}",
            envelope.return_value
        )));
    }
    let returned = int(envelope.draw_no.as_ref()).unwrap_or(0);
    if returned <= 0 {
        return Err(SourceError::parse("mirror envelope has no draw number"));
    }
    if returned != i64::from(draw_no) {
        return Err(SourceError::parse(format!(
            "mirror answered draw {returned} for draw {draw_no}"
        )));
    }

    let numbers = [
        &envelope.n1,
        &envelope.n2,
        &envelope.n3,
        &envelope.n4,
        &envelope.n5,
        &envelope.n6,
    ]
    .into_iter()
    .map(|value| int(value.as_ref()).ok_or_else(|| SourceError::parse("winning number")))
    .collect::<Result<Vec<_>, _>>()?;

    let record = DrawRecord {
        draw_no: returned,
        draw_date: envelope.draw_date.unwrap_or_default(),
        numbers,
        bonus: int(envelope.bonus.as_ref()).ok_or_else(|| SourceError::parse("bonus"))?,
        first_prize_amount: int(envelope.first_prize_amount.as_ref()).unwrap_or(0),
    };
    Ok(Draw::try_from(record)?)
}

/// JSON mirror answering one draw per request.
#[derive(Debug, Clone)]
pub struct MirrorSource {
    upstream: Upstream,
    url_template: String,
}

impl MirrorSource {
    pub fn new(upstream: Upstream, url_template: impl Into<String>) -> Self {
        Self {
            upstream,
            url_template: url_template.into(),
        }
    }
}

impl DrawSource for MirrorSource {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::Mirror
    }

    fn label(&self) -> &str {
        &self.url_template
    }

    async fn fetch_draw(&self, draw_no: u32) -> Result<Draw, SourceError> {
        let url = draw_url(&self.url_template, draw_no);
        let body = self.upstream.get_text(&url).await?;
        parse_mirror_envelope(draw_no, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAW_1105: &str = r#"{"totSellamnt":111840714000,"returnValue":"success","drwNoDate":"2024-02-03","firstWinamnt":2605499375,"drwtNo6":40,"drwtNo4":37,"firstPrzwnerCo":11,"drwtNo5":39,"bnusNo":8,"firstAccumamnt":28660493125,"drwNo":1105,"drwtNo2":16,"drwtNo3":34,"drwtNo1":6}"#;

    #[test]
    fn parses_successful_envelope() {
        let draw = parse_mirror_envelope(1105, DRAW_1105).expect("valid envelope");
        assert_eq!(draw.draw_no(), 1105);
        assert_eq!(draw.numbers(), &[6, 16, 34, 37, 39, 40]);
        assert_eq!(draw.bonus(), 8);
        assert_eq!(draw.first_prize_amount(), 2_605_499_375);
    }

    #[test]
    fn rejects_failures_and_foreign_draws() {
        assert!(parse_mirror_envelope(1106, r#"{"returnValue":"fail"}"#).is_err());
        assert!(parse_mirror_envelope(1105, "<html>maintenance</html>").is_err());
        assert!(parse_mirror_envelope(1104, DRAW_1105).is_err());
        assert!(
            parse_mirror_envelope(1, r#"{"returnValue":"success","drwNo":0}"#).is_err()
        );
    }
}
