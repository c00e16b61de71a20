// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! LCD `GetTxsEvent` payloads and the denom table.

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::wire::{amount_text, null_as_empty};
use crate::errors::ClassificationError;
use crate::types::amount::{to_decimal, Decimals};

/// Response of `/cosmos/tx/v1beta1/txs`.
#[derive(Debug, Clone, Deserialize)]
pub struct TxSearchResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tx_responses: Vec<TxResponse>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
}

/// One indexed transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    /// RFC 3339 block time
    pub timestamp: String,
    #[serde(default)]
    pub tx: Option<TxEnvelope>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub events: Vec<Event>,
    /// Pre-0.47 nodes report events per message here instead
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<MessageLog>,
}

impl TxResponse {
    /// Messages in the transaction body, in order.
    pub fn messages(&self) -> &[Value] {
        self.tx
            .as_ref()
            .map(|tx| tx.body.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn fee(&self) -> Option<&Fee> {
        self.tx.as_ref()?.auth_info.as_ref()?.fee.as_ref()
    }

    /// Events of the given type. Flattened transaction events are preferred;
    /// message logs are the fallback for older nodes.
    pub fn events_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        let flattened: Box<dyn Iterator<Item = &'a Event> + 'a> = if self.events.is_empty() {
            Box::new(self.logs.iter().flat_map(|log| log.events.iter()))
        } else {
            Box::new(self.events.iter())
        };
        flattened.filter(move |event| event.kind == kind)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxEnvelope {
    pub body: TxBody,
    #[serde(default)]
    pub auth_info: Option<AuthInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxBody {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub fee: Option<Fee>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fee {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub amount: Vec<Coin>,
    #[serde(default)]
    pub payer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// Display quantity and symbol.
    pub fn resolve(&self) -> Result<(BigDecimal, String), ClassificationError> {
        let denom = resolve_denom(&self.denom);
        Ok((to_decimal(&self.amount, denom.decimals)?, denom.symbol))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageLog {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Vec<Attribute>,
}

impl Event {
    /// First value of `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| a.value.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Parse an event coin list such as `"1500uatom,20ibc/27394F..."`.
///
/// Entries without a leading amount are ignored.
pub fn parse_coins(text: &str) -> Vec<Coin> {
    text.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let split = entry.find(|c: char| !c.is_ascii_digit())?;
            let (amount, denom) = entry.split_at(split);
            (!amount.is_empty() && !denom.is_empty()).then(|| Coin::new(denom, amount))
        })
        .collect()
}

/// Display symbol and precision of a denom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenomInfo {
    pub symbol: String,
    pub decimals: Decimals,
}

/// Well-known IBC vouchers on the Hub and Osmosis.
const KNOWN_IBC: [(&str, &str); 4] = [
    (
        "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2",
        "ATOM",
    ),
    (
        "ibc/498A0751C798A0D9A389AA3691123DADA57DAA4FE165D5C75894505B876BA6E4",
        "USDC",
    ),
    (
        "ibc/14F9BC3E44B8A9C1BE1FB08980FAB87034C9905EF17CF2F5008FC085218811CC",
        "OSMO",
    ),
    (
        "ibc/D189335C6E4A68B513C10AB227BF1C1D38C746766278BA3EEB4FB14124F1D858",
        "USDC.axl",
    ),
];

/// Decimals of Osmosis GAMM pool shares.
const POOL_SHARE_DECIMALS: Decimals = Decimals::new(18);

/// Resolve a denom to its display form. Unknown denoms use 6 decimals.
pub fn resolve_denom(denom: &str) -> DenomInfo {
    let micro = |symbol: &str| DenomInfo {
        symbol: symbol.to_string(),
        decimals: Decimals::COSMOS_MICRO,
    };

    match denom {
        "uatom" => return micro("ATOM"),
        "uosmo" => return micro("OSMO"),
        "uion" => return micro("ION"),
        _ => {}
    }
    if let Some((_, symbol)) = KNOWN_IBC.iter().find(|(d, _)| d.eq_ignore_ascii_case(denom)) {
        return micro(symbol);
    }
    if let Some(pool) = denom.strip_prefix("gamm/pool/") {
        return DenomInfo {
            symbol: format!("GAMM-{pool}"),
            decimals: POOL_SHARE_DECIMALS,
        };
    }
    if let Some(hash) = denom.strip_prefix("ibc/") {
        let short: String = hash.chars().take(6).collect();
        return micro(&format!("IBC/{short}"));
    }

    // Trace paths (transfer/channel-0/uatom) and tokenfactory denoms
    // (factory/osmo1.../name) display by their last segment.
    let base = denom.rsplit('/').next().unwrap_or(denom);
    match base.strip_prefix('u') {
        Some(rest) if base.len() > 1 && rest.chars().all(|c| c.is_ascii_lowercase()) => {
            micro(&rest.to_ascii_uppercase())
        }
        _ => micro(&base.to_ascii_uppercase()),
    }
}
