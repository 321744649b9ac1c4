//! ICS feed parsing.
//!
//! Turns the text of a calendar feed into `RawEvent`s according to RFC 5545.

mod parse;

pub use parse::parse_calendar;
