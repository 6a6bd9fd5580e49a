use std::ops::RangeInclusive;

/// Most draws requested in one range call.
pub const MAX_DRAWS_PER_REQUEST: u32 = 301;

/// Splits `start..=end` into consecutive sub-ranges of at most
/// [`MAX_DRAWS_PER_REQUEST`] draws. Empty when `start > end`.
pub fn chunk_ranges(start: u32, end: u32) -> Vec<RangeInclusive<u32>> {
    let mut chunks = Vec::new();
    let mut chunk_start = start;
    while chunk_start <= end {
        let chunk_end = end.min(chunk_start.saturating_add(MAX_DRAWS_PER_REQUEST - 1));
        chunks.push(chunk_start..=chunk_end);
        match chunk_end.checked_add(1) {
            Some(next) => chunk_start = next,
            None => break,
        }
    }
    chunks
}
