// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use super::format::{format_date, format_quantity, optional_quantity};
use super::render_rows;
use crate::types::transaction::{AdditionalAsset, AssetAmount, Transaction};

/// Columns of the single-asset layout.
pub const STANDARD_HEADER: [&str; 12] = [
    "Date",
    "Received Quantity",
    "Received Currency",
    "Received Fiat Amount",
    "Sent Quantity",
    "Sent Currency",
    "Sent Fiat Amount",
    "Fee Amount",
    "Fee Currency",
    "Transaction Hash",
    "Notes",
    "Tag",
];

const TRAILING_HEADER: [&str; 5] = ["Fee Amount", "Fee Currency", "Transaction Hash", "Notes", "Tag"];

/// Number of slot groups the multi-asset layout needs, or `None` when no
/// transaction has additional assets.
///
/// Only transactions with additional assets count toward the maximum; the
/// primary legs are included in their counts.
pub fn multi_asset_slots(transactions: &[Transaction]) -> Option<usize> {
    transactions
        .iter()
        .filter(|tx| tx.has_additional_assets())
        .map(|tx| tx.received_count().max(tx.sent_count()))
        .max()
}

/// Render transactions in the Awaken standard layout, switching to the
/// multi-asset layout when any transaction has additional assets. Rows keep
/// input order.
pub fn generate_standard_csv(transactions: &[Transaction]) -> String {
    match multi_asset_slots(transactions) {
        None => {
            let header: Vec<String> = STANDARD_HEADER.iter().map(|c| c.to_string()).collect();
            render_rows(&header, transactions.iter().map(standard_row))
        }
        Some(slots) => render_rows(
            &multi_asset_header(slots),
            transactions.iter().map(|tx| multi_asset_row(tx, slots)),
        ),
    }
}

fn standard_row(tx: &Transaction) -> Vec<String> {
    let mut row = vec![format_date(&tx.date)];
    row.extend(asset_cells(tx.received.as_ref()));
    row.extend(asset_cells(tx.sent.as_ref()));
    row.extend(trailing_cells(tx));
    row
}

fn asset_cells(asset: Option<&AssetAmount>) -> [String; 3] {
    match asset {
        Some(asset) => [
            format_quantity(&asset.quantity),
            asset.currency.clone(),
            String::new(),
        ],
        None => Default::default(),
    }
}

fn multi_asset_header(slots: usize) -> Vec<String> {
    let mut header = vec!["Date".to_string()];
    for n in 1..=slots {
        header.extend([
            format!("Received Quantity {n}"),
            format!("Received Currency {n}"),
            format!("Received Fiat Amount {n}"),
            format!("Sent Quantity {n}"),
            format!("Sent Currency {n}"),
            format!("Sent Fiat Amount {n}"),
        ]);
    }
    header.extend(TRAILING_HEADER.iter().map(|c| c.to_string()));
    header
}

fn multi_asset_row(tx: &Transaction, slots: usize) -> Vec<String> {
    let received = tx.received_legs();
    let sent = tx.sent_legs();
    let mut row = vec![format_date(&tx.date)];
    for n in 0..slots {
        row.extend(leg_cells(received.get(n)));
        row.extend(leg_cells(sent.get(n)));
    }
    row.extend(trailing_cells(tx));
    row
}

fn leg_cells(leg: Option<&AdditionalAsset>) -> [String; 3] {
    match leg {
        Some(leg) => [
            format_quantity(&leg.quantity),
            leg.currency.clone(),
            optional_quantity(leg.fiat_amount.as_ref()),
        ],
        None => Default::default(),
    }
}

fn trailing_cells(tx: &Transaction) -> [String; 5] {
    let (fee_amount, fee_currency) = match &tx.fee {
        Some(fee) => (format_quantity(&fee.quantity), fee.currency.clone()),
        None => (String::new(), String::new()),
    };
    [
        fee_amount,
        fee_currency,
        tx.tx_hash.clone().unwrap_or_default(),
        tx.notes.clone().unwrap_or_default(),
        tx.tag.clone().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::TransactionType;
    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn send() -> Transaction {
        Transaction::builder(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(), TransactionType::Send)
            .sent(dec("1.123456789"), "KAS")
            .fee(dec("0.0001"), "KAS")
            .tx_hash("abc")
            .notes("rent, march \"final\"")
            .build()
            .unwrap()
    }

    fn lp_add() -> Transaction {
        let mut tx = Transaction::builder(
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
            TransactionType::LpAdd,
        )
        .sent(dec("10"), "ATOM")
        .received(dec("3"), "GAMM-1")
        .build()
        .unwrap();
        tx.additional_sent.push(AdditionalAsset::new(dec("25"), "OSMO"));
        tx.additional_sent.push(AdditionalAsset {
            quantity: dec("5"),
            currency: "USDC".into(),
            fiat_amount: Some(dec("5.00")),
        });
        tx
    }

    #[test]
    fn standard_layout() {
        let csv = generate_standard_csv(&[send()]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines[0], STANDARD_HEADER.join(","));
        assert_eq!(
            lines[1],
            "05/01/2024 08:30:00,,,,1.12345679,KAS,,0.0001,KAS,abc,\"rent, march \"\"final\"\"\","
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn empty_input_is_header_only() {
        assert_eq!(generate_standard_csv(&[]), STANDARD_HEADER.join(","));
    }

    #[test]
    fn multi_asset_layout_expands_slots() {
        let csv = generate_standard_csv(&[lp_add(), send()]);
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let header = reader.headers().unwrap().clone();
        assert_eq!(header.len(), 1 + 3 * 6 + 5);
        assert_eq!(&header[1], "Received Quantity 1");
        assert_eq!(&header[18], "Sent Fiat Amount 3");
        assert!(!header.iter().any(|c| c.ends_with(" 4")));

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(&rows[0][4], "10");
        assert_eq!(&rows[0][10], "25");
        assert_eq!(&rows[0][16], "5");
        assert_eq!(&rows[0][18], "5");
        // The plain send fills slot 1 only.
        assert_eq!(&rows[1][5], "KAS");
        assert!((7..19).all(|i| rows[1][i].is_empty()));
    }

    #[test]
    fn slots_ignore_plain_transactions() {
        assert_eq!(multi_asset_slots(&[send()]), None);
        assert_eq!(multi_asset_slots(&[send(), lp_add()]), Some(3));
    }
}
