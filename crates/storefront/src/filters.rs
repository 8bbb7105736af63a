//! Custom Askama template filters.
//!
//! Modules whose templates use these filters bring them into scope with
//! `use crate::filters;`.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a number with one decimal place, e.g. an average rating.
///
/// Usage in templates: `{{ average_rating|one_decimal }}`
#[askama::filter_fn]
pub fn one_decimal(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(text
        .parse::<f64>()
        .map_or(text, |number| format!("{number:.1}")))
}

/// Renders a star rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating.stars()|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let filled = value.to_string().parse::<usize>().unwrap_or(0).min(5);
    Ok(format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)))
}
