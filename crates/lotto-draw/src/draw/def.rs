use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const NUMBERS_PER_DRAW: usize = 6;
pub const BALL_MIN: u8 = 1;
pub const BALL_MAX: u8 = 45;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One published draw. Numbers are kept ascending and the record never
/// changes once it has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", try_from = "DrawRecord")]
pub struct Draw {
    draw_no: u32,
    draw_date: NaiveDate,
    numbers: [u8; NUMBERS_PER_DRAW],
    bonus: u8,
    first_prize_amount: u64,
}

/// Loosely typed draw as it arrives from the wire or a seed file.
///
/// Integers are kept wide so that out-of-range values surface as
/// [`DrawError`] instead of a serde failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    pub draw_no: i64,
    pub draw_date: String,
    pub numbers: Vec<i64>,
    pub bonus: i64,
    #[serde(default)]
    pub first_prize_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("draw number must be a positive integer, got {0}")]
    InvalidDrawNo(i64),
    #[error("invalid draw date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid number count: expected 6, got {0}")]
    InvalidNumberCount(usize),
    #[error("number {0} is out of range (1-45)")]
    NumberOutOfRange(i64),
    #[error("duplicate numbers found")]
    DuplicateNumber,
    #[error("bonus {0} is out of range (1-45)")]
    BonusOutOfRange(i64),
    #[error("first prize amount must be non-negative, got {0}")]
    NegativePrize(i64),
}

impl Draw {
    pub fn new(
        draw_no: u32,
        draw_date: NaiveDate,
        mut numbers: impl AsMut<[u8]>,
        bonus: u8,
        first_prize_amount: u64,
    ) -> Result<Self, DrawError> {
        if draw_no == 0 {
            return Err(DrawError::InvalidDrawNo(0));
        }

        let numbers = numbers.as_mut();
        if numbers.len() != NUMBERS_PER_DRAW {
            return Err(DrawError::InvalidNumberCount(numbers.len()));
        }
        if let Some(&ball) = numbers.iter().find(|&&n| !in_range(n)) {
            return Err(DrawError::NumberOutOfRange(i64::from(ball)));
        }
        if !in_range(bonus) {
            return Err(DrawError::BonusOutOfRange(i64::from(bonus)));
        }

        numbers.sort_unstable();
        if numbers.windows(2).any(|w| w[0] == w[1]) {
            return Err(DrawError::DuplicateNumber);
        }
        let numbers = <[u8; NUMBERS_PER_DRAW]>::try_from(&*numbers)
            .map_err(|_e| DrawError::InvalidNumberCount(numbers.len()))?;

        Ok(Self {
            draw_no,
            draw_date,
            numbers,
            bonus,
            first_prize_amount,
        })
    }

    pub fn draw_no(&self) -> u32 {
        self.draw_no
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    pub fn numbers(&self) -> &[u8; NUMBERS_PER_DRAW] {
        &self.numbers
    }

    pub fn bonus(&self) -> u8 {
        self.bonus
    }

    pub fn first_prize_amount(&self) -> u64 {
        self.first_prize_amount
    }

    pub fn formatted_date(&self) -> String {
        self.draw_date.format(DATE_FORMAT).to_string()
    }

    pub fn format_numbers(&self) -> String {
        let [n1, n2, n3, n4, n5, n6] = self.numbers;
        format!(
            "{n1:02} {n2:02} {n3:02} {n4:02} {n5:02} {n6:02} + {:02}",
            self.bonus
        )
    }
}

fn in_range(ball: u8) -> bool {
    (BALL_MIN..=BALL_MAX).contains(&ball)
}

fn ball_from_i64(value: i64) -> Option<u8> {
    u8::try_from(value).ok().filter(|&b| in_range(b))
}

/// Parses a strict `YYYY-MM-DD` date.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, DrawError> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(DrawError::InvalidDate(value.to_owned()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_e| DrawError::InvalidDate(value.to_owned()))
}

impl TryFrom<DrawRecord> for Draw {
    type Error = DrawError;

    fn try_from(record: DrawRecord) -> Result<Self, Self::Error> {
        let draw_no = u32::try_from(record.draw_no)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(DrawError::InvalidDrawNo(record.draw_no))?;

        let draw_date = parse_date(&record.draw_date)?;

        if record.numbers.len() != NUMBERS_PER_DRAW {
            return Err(DrawError::InvalidNumberCount(record.numbers.len()));
        }
        let numbers = record
            .numbers
            .iter()
            .map(|&n| ball_from_i64(n).ok_or(DrawError::NumberOutOfRange(n)))
            .collect::<Result<Vec<u8>, _>>()?;

        let bonus = ball_from_i64(record.bonus).ok_or(DrawError::BonusOutOfRange(record.bonus))?;

        let first_prize_amount = u64::try_from(record.first_prize_amount)
            .map_err(|_e| DrawError::NegativePrize(record.first_prize_amount))?;

        Self::new(draw_no, draw_date, numbers, bonus, first_prize_amount)
    }
}

impl From<&Draw> for DrawRecord {
    fn from(draw: &Draw) -> Self {
        Self {
            draw_no: i64::from(draw.draw_no),
            draw_date: draw.formatted_date(),
            numbers: draw.numbers.iter().map(|&n| i64::from(n)).collect(),
            bonus: i64::from(draw.bonus),
            first_prize_amount: i64::try_from(draw.first_prize_amount).unwrap_or(i64::MAX),
        }
    }
}

impl Display for Draw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {}",
            self.draw_no,
            self.formatted_date(),
            self.format_numbers()
        )
    }
}
