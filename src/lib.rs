//! Terminal front end for the local draw history.

pub mod report;
