use std::fmt::Display;

use anyhow::Result;
use chrono::NaiveDate;
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::utils::{clock::Clock, time::record_to_date};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Turns user input into a calendar date. ISO dates are taken as is, anything else goes through
/// free-form parsing relative to `clock`, for example "tomorrow", "next friday" or "15/03/2025".
pub fn parse_user_date(
    value: &str,
    clock: &dyn Clock,
    date_style: DateStyle,
    argument: &str,
) -> Result<NaiveDate> {
    if let Ok(date) = record_to_date(value) {
        return Ok(date);
    }
    parse_date_string(value, clock.now(), date_style.into())
        .map(|v| v.date_naive())
        .map_err(|e| {
            Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate {argument} {value:?}: {e}"),
                )
                .into()
        })
}

/// Same as [parse_user_date] but a missing value means today.
pub fn parse_user_date_or_today(
    value: Option<&str>,
    clock: &dyn Clock,
    date_style: DateStyle,
    argument: &str,
) -> Result<NaiveDate> {
    match value {
        Some(value) => parse_user_date(value, clock, date_style, argument),
        None => Ok(clock.now().date_naive()),
    }
}
