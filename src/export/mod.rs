// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Awaken CSV rendering.
//!
//! Two layouts:
//!
//! - **Standard**: one row per [`Transaction`](crate::Transaction), 12 columns.
//!   When any transaction carries additional assets, the whole file switches
//!   to the multi-asset layout with numbered received/sent slot groups.
//! - **Perpetuals**: one row per [`PerpTransaction`](crate::PerpTransaction),
//!   9 columns.
//!
//! Rendering never fails. Missing optional fields become empty cells, rows
//! are joined with `\n`, and no newline follows the last row.
//!
//! ```rust
//! use awakenscan::export::generate_standard_csv;
//!
//! let csv = generate_standard_csv(&[]);
//! assert!(csv.starts_with("Date,Received Quantity"));
//! ```

mod format;
mod perps;
mod standard;

pub use format::{format_date, format_pnl, format_quantity, QUANTITY_DECIMALS};
pub use perps::{generate_perps_csv, PERPS_HEADER};
pub use standard::{generate_standard_csv, multi_asset_slots, STANDARD_HEADER};

use tracing::error;

/// Write a header and rows with the csv crate writer (`\n` terminator,
/// quoting only where needed) and drop the final newline.
pub(crate) fn render_rows<I>(header: &[String], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    match try_render(header, rows) {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to render CSV");
            String::new()
        }
    }
}

fn try_render<I>(header: &[String], rows: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut buffer = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }
    let mut text = String::from_utf8_lossy(&buffer).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
