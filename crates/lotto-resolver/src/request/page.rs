use std::sync::LazyLock;

use chrono::NaiveDate;
use lotto_draw::{Draw, NUMBERS_PER_DRAW, scheduled_date};
use regex::Regex;

use super::{
    Upstream, draw_url,
    provider::{DrawSource, UpstreamKind},
};
use crate::error::SourceError;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

// Blocks are cut at the first closing div; the ball badges sit in a <p> inside.
static WIN_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?s)class="[^"]*\bnum win\b[^"]*".*?</div>"#));
static BONUS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?s)class="[^"]*\bnum bonus\b[^"]*".*?</div>"#));
static BALL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"<span[^>]*class="[^"]*\bball_645\b[^"]*"[^>]*>\s*(\d{1,2})\s*</span>"#)
});
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?s)class="desc"[^>]*>(.*?)</"#));
static DATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(\d{4})\D+(\d{1,2})\D+(\d{1,2})"));

fn balls_in(block: &Regex, html: &str) -> Vec<u8> {
    block
        .find(html)
        .map(|m| {
            BALL.captures_iter(m.as_str())
                .filter_map(|c| c.get(1)?.as_str().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn page_date(html: &str) -> Option<NaiveDate> {
    let description = DESCRIPTION.captures(html)?.get(1)?.as_str();
    let captures = DATE.captures(description)?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    let month = captures.get(2)?.as_str().parse().ok()?;
    let day = captures.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Scrapes a human-readable result page.
///
/// Needs six winning badges and a bonus badge. A page without a readable
/// date falls back to the weekly cadence date. First-prize amount is not
/// read from the page.
pub fn parse_result_page(draw_no: u32, html: &str) -> Result<Draw, SourceError> {
    let numbers = balls_in(&WIN_BLOCK, html);
    if numbers.len() < NUMBERS_PER_DRAW {
        return Err(SourceError::parse(format!(
            "result page shows {} winning numbers",
            numbers.len()
        )));
    }
    let bonus = balls_in(&BONUS_BLOCK, html)
        .first()
        .copied()
        .ok_or_else(|| SourceError::parse("result page shows no bonus number"))?;
    let draw_date = page_date(html)
        .or_else(|| scheduled_date(draw_no))
        .ok_or_else(|| SourceError::parse("result page has no usable date"))?;

    let mut winning = [0_u8; NUMBERS_PER_DRAW];
    winning.copy_from_slice(&numbers[..NUMBERS_PER_DRAW]);
    Ok(Draw::new(draw_no, draw_date, winning, bonus, 0)?)
}

/// Public result page, the last resort per draw.
#[derive(Debug, Clone)]
pub struct PageSource {
    upstream: Upstream,
    url_template: String,
}

impl PageSource {
    pub fn new(upstream: Upstream, url_template: impl Into<String>) -> Self {
        Self {
            upstream,
            url_template: url_template.into(),
        }
    }
}

impl DrawSource for PageSource {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::Page
    }

    fn label(&self) -> &str {
        &self.url_template
    }

    async fn fetch_draw(&self, draw_no: u32) -> Result<Draw, SourceError> {
        let url = draw_url(&self.url_template, draw_no);
        let html = self.upstream.get_text(&url).await?;
        parse_result_page(draw_no, &html)
    }
}
