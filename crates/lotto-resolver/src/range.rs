use lotto_draw::Draw;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{error::RangeValidationError, resolver::DrawResolver};

/// Largest accepted `end - start`.
pub const MAX_RANGE_SPAN: u32 = 300;
/// Ranges this narrow may fall back to mirrors and page scraping.
pub const DEEP_FALLBACK_SPAN: u32 = 2;

/// Validated inclusive draw range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    start: u32,
    end: u32,
}

impl RangeRequest {
    pub fn new(start: i64, end: i64) -> Result<Self, RangeValidationError> {
        let positive = |value: i64| u32::try_from(value).ok().filter(|&v| v > 0);
        let (Some(start), Some(end)) = (positive(start), positive(end)) else {
            return Err(RangeValidationError::NotPositiveInteger);
        };
        if start > end {
            return Err(RangeValidationError::Inverted { start, end });
        }
        if end - start > MAX_RANGE_SPAN {
            return Err(RangeValidationError::TooLarge {
                span: end - start + 1,
                max: MAX_RANGE_SPAN + 1,
            });
        }
        Ok(Self { start, end })
    }

    /// Parses raw query values. Anything that is not a whole number fails.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, RangeValidationError> {
        let integer = |value: Option<&str>| {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or(RangeValidationError::NotPositiveInteger)
        };
        Self::new(integer(start)?, integer(end)?)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn allow_deep_fallback(&self) -> bool {
        self.end - self.start <= DEEP_FALLBACK_SPAN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RangeResult {
    /// Resolved draws, ascending.
    pub draws: Vec<Draw>,
    /// Draw numbers in the range that no strategy could resolve.
    pub missing: Vec<u32>,
}

/// Resolves every draw of `request` one after another, ascending.
pub async fn fetch_range(resolver: &DrawResolver, request: RangeRequest) -> RangeResult {
    let deep = request.allow_deep_fallback();
    let mut result = RangeResult::default();
    for draw_no in request.start..=request.end {
        match resolver.resolve(draw_no, deep).await {
            Some(draw) => result.draws.push(draw),
            None => result.missing.push(draw_no),
        }
    }
    log::info!(
        "range={}..={} count={} missing={}",
        request.start,
        request.end,
        result.draws.len(),
        result.missing.len()
    );
    result
}
