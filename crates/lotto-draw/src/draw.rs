mod def;
mod schedule;

pub use def::{BALL_MAX, BALL_MIN, Draw, DrawError, DrawRecord, NUMBERS_PER_DRAW};
pub use schedule::{FIRST_DRAW_DATE, estimate_latest, scheduled_date};
