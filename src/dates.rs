//! Calendar conversions between day ordinals, `(year, month, day)` tuples
//! and `YYYY-MM-DD` strings.
//!
//! Ordinals count days in the proleptic Gregorian calendar with
//! `0001-01-01` as day 1.

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date: {0:04}-{1:02}-{2:02}")]
    InvalidDate(i32, u32, u32),
    #[error("day ordinal {0} is out of range")]
    InvalidOrdinal(i32),
    #[error("invalid date format: '{0}'. Use 'YYYY-MM-DD'")]
    InvalidFormat(String),
}

pub fn ordinal_to_ymd(ordinal: i32) -> Result<(i32, u32, u32), DateError> {
    Ok(split(from_ordinal(ordinal)?))
}

pub fn ymd_to_ordinal(year: i32, month: u32, day: u32) -> Result<i32, DateError> {
    Ok(from_ymd(year, month, day)?.num_days_from_ce())
}

pub fn ordinal_to_string(ordinal: i32) -> Result<String, DateError> {
    Ok(from_ordinal(ordinal)?.format(DATE_FORMAT).to_string())
}

pub fn string_to_ordinal(raw: &str) -> Result<i32, DateError> {
    Ok(parse(raw)?.num_days_from_ce())
}

pub fn ymd_to_string(year: i32, month: u32, day: u32) -> Result<String, DateError> {
    Ok(from_ymd(year, month, day)?.format(DATE_FORMAT).to_string())
}

pub fn string_to_ymd(raw: &str) -> Result<(i32, u32, u32), DateError> {
    Ok(split(parse(raw)?))
}

/// Today's ordinal in the local time zone.
pub fn today_ordinal() -> i32 {
    Local::now().date_naive().num_days_from_ce()
}

fn from_ordinal(ordinal: i32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_num_days_from_ce_opt(ordinal).ok_or(DateError::InvalidOrdinal(ordinal))
}

fn from_ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidDate(year, month, day))
}

fn parse(raw: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| DateError::InvalidFormat(raw.to_owned()))
}

fn split(date: NaiveDate) -> (i32, u32, u32) {
    (date.year(), date.month(), date.day())
}
