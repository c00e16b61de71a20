// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use super::format::{format_date, format_pnl, format_quantity, optional_quantity};
use super::render_rows;
use crate::types::perp::PerpTransaction;

/// Columns of the perpetuals layout.
pub const PERPS_HEADER: [&str; 9] = [
    "Date",
    "Asset",
    "Amount",
    "Fee",
    "P&L",
    "Payment Token",
    "Notes",
    "Transaction Hash",
    "Tag",
];

/// Render perpetuals records in input order.
pub fn generate_perps_csv(transactions: &[PerpTransaction]) -> String {
    let header: Vec<String> = PERPS_HEADER.iter().map(|c| c.to_string()).collect();
    render_rows(&header, transactions.iter().map(perp_row))
}

fn perp_row(tx: &PerpTransaction) -> Vec<String> {
    vec![
        format_date(&tx.date),
        tx.asset.clone(),
        format_quantity(&tx.amount),
        optional_quantity(tx.fee.as_ref()),
        format_pnl(&tx.pnl),
        tx.payment_token.clone(),
        tx.notes.clone().unwrap_or_default(),
        tx.tx_hash.clone().unwrap_or_default(),
        tx.tag.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::perp::PerpTag;
    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    #[test]
    fn renders_signed_pnl_and_tags() {
        let close = PerpTransaction::new(
            Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
            "BTC",
            BigDecimal::from_str("-0.015").unwrap(),
            Some(BigDecimal::from_str("0.42").unwrap()),
            BigDecimal::from_str("-120.5").unwrap(),
            "USDC",
            Some("0xabc".into()),
            PerpTag::ClosePosition,
        );
        let funding = PerpTransaction::new(
            Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            "ETH",
            BigDecimal::from(0),
            None,
            BigDecimal::from_str("0.123456789").unwrap(),
            "USDC",
            None,
            PerpTag::FundingPayment,
        )
        .with_notes("Funding rate 0.0000125");

        let csv = generate_perps_csv(&[close, funding]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Asset,Amount,Fee,P&L,Payment Token,Notes,Transaction Hash,Tag");
        assert_eq!(lines[1], "06/30/2024 23:59:59,BTC,0.015,0.42,-120.5,USDC,,0xabc,close_position");
        assert_eq!(
            lines[2],
            "07/01/2024 00:00:00,ETH,0,,0.12345679,USDC,Funding rate 0.0000125,,funding_payment"
        );
    }
}
