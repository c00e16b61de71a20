// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cell formatting shared by both layouts.

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};

/// Decimal places kept in numeric cells.
pub const QUANTITY_DECIMALS: i64 = 8;

const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Render a magnitude: at most 8 decimals (half-up), trailing zeros
/// stripped, plain notation.
pub fn format_quantity(value: &BigDecimal) -> String {
    format_signed(&value.abs())
}

/// Render a profit or loss. The only numeric cell that keeps its sign.
pub fn format_pnl(value: &BigDecimal) -> String {
    format_signed(value)
}

/// `MM/DD/YYYY HH:MM:SS` in UTC.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_signed(value: &BigDecimal) -> String {
    let rounded = value
        .with_scale_round(QUANTITY_DECIMALS, RoundingMode::HalfUp)
        .normalized();
    rounded.to_plain_string()
}

pub(crate) fn optional_quantity(value: Option<&BigDecimal>) -> String {
    value.map(format_quantity).unwrap_or_default()
}
