//! Shared draw entity of the 6/45 lottery series.
//!
//! Every component of the pipeline exchanges [`Draw`] values; the only way to
//! obtain one is through validation, so downstream code never re-checks the
//! invariants.

pub mod draw;

pub use draw::{
    BALL_MAX, BALL_MIN, Draw, DrawError, DrawRecord, FIRST_DRAW_DATE, NUMBERS_PER_DRAW,
    estimate_latest, scheduled_date,
};
