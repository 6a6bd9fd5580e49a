//! Plain-text rendering of stored draws and sync state.

use lotto_client::{SyncReport, SyncState};
use lotto_draw::Draw;

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn draw_line(draw: &Draw) -> String {
    format!(
        "{draw}  1st prize {} KRW",
        group_thousands(draw.first_prize_amount())
    )
}

pub fn sync_summary(report: &SyncReport) -> String {
    if report.count == 0 {
        format!("Already up to date (latest #{})", report.local_latest)
    } else {
        format!(
            "{} sync stored {} draws (latest #{})",
            report.mode, report.count, report.local_latest
        )
    }
}

pub fn status_lines(stored: i64, local_latest: u32, state: &SyncState) -> Vec<String> {
    let last_sync = state
        .last_sync_time()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_owned());
    vec![
        format!("Stored draws : {stored}"),
        format!("Latest draw  : #{local_latest}"),
        format!("Last sync    : {last_sync}"),
    ]
}

/// Most drawn first; ties by ball number.
pub fn frequency_lines(mut frequencies: Vec<(u8, usize)>) -> Vec<String> {
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let max = frequencies.first().map(|&(_, count)| count).unwrap_or(0).max(1);
    frequencies
        .into_iter()
        .map(|(ball, count)| {
            let bar = "#".repeat(count * 30 / max);
            format!("{ball:02} {count:>5} {bar}")
        })
        .collect()
}
