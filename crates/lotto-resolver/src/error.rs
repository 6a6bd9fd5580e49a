use lotto_draw::DrawError;

/// Failure of a single upstream strategy. Never escapes the per-draw
/// resolver: a failed strategy simply hands over to the next one.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected upstream payload: {0}")]
    Parse(String),
    #[error("upstream draw is invalid: {0}")]
    Draw(#[from] DrawError),
}

impl SourceError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

/// No strategy could determine the newest draw number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to resolve latest draw (probed {from} down to {to})")]
pub struct LatestResolutionError {
    pub from: u32,
    pub to: u32,
}

/// Caller supplied range is unusable; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeValidationError {
    #[error("start and end must be positive integers")]
    NotPositiveInteger,
    #[error("start {start} is greater than end {end}")]
    Inverted { start: u32, end: u32 },
    #[error("range too large: {span} draws requested, max {max} draws per request")]
    TooLarge { span: u32, max: u32 },
}
