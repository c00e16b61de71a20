// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Message classification for Cosmos SDK transactions.
//!
//! A transaction is classified by its primary message (the first one that is
//! not an IBC client update). Amounts that the message itself does not carry
//! (claimed rewards, swap output, received IBC tokens) are read from the
//! transaction events.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::types::{parse_coins, Coin, TxResponse};
use crate::classify;
use crate::errors::ClassificationError;
use crate::types::transaction::{Transaction, TransactionType};

/// Message kinds the classifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Send,
    MultiSend,
    Delegate,
    Undelegate,
    Redelegate,
    WithdrawReward,
    WithdrawCommission,
    IbcTransfer,
    IbcReceive,
    Swap,
    JoinPool,
    ExitPool,
    Vote,
    Grant,
    Unknown,
}

const MSG_UPDATE_CLIENT: &str = "/ibc.core.client.v1.MsgUpdateClient";

impl MessageKind {
    pub fn from_type_url(type_url: &str) -> Self {
        match type_url {
            "/cosmos.bank.v1beta1.MsgSend" => MessageKind::Send,
            "/cosmos.bank.v1beta1.MsgMultiSend" => MessageKind::MultiSend,
            "/cosmos.staking.v1beta1.MsgDelegate" => MessageKind::Delegate,
            "/cosmos.staking.v1beta1.MsgUndelegate" => MessageKind::Undelegate,
            "/cosmos.staking.v1beta1.MsgBeginRedelegate" => MessageKind::Redelegate,
            "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward" => {
                MessageKind::WithdrawReward
            }
            "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission" => {
                MessageKind::WithdrawCommission
            }
            "/ibc.applications.transfer.v1.MsgTransfer" => MessageKind::IbcTransfer,
            "/ibc.core.channel.v1.MsgRecvPacket" => MessageKind::IbcReceive,
            "/osmosis.gamm.v1beta1.MsgJoinPool" => MessageKind::JoinPool,
            "/osmosis.gamm.v1beta1.MsgExitPool" => MessageKind::ExitPool,
            "/cosmos.gov.v1beta1.MsgVote" | "/cosmos.gov.v1.MsgVote" => MessageKind::Vote,
            "/cosmos.authz.v1beta1.MsgGrant" => MessageKind::Grant,
            other if is_osmosis_swap(other) => MessageKind::Swap,
            _ => MessageKind::Unknown,
        }
    }
}

fn is_osmosis_swap(type_url: &str) -> bool {
    type_url.starts_with("/osmosis.")
        && [
            "MsgSwapExactAmountIn",
            "MsgSwapExactAmountOut",
            "MsgSplitRouteSwapExactAmountIn",
            "MsgSplitRouteSwapExactAmountOut",
        ]
        .iter()
        .any(|name| type_url.ends_with(name))
}

/// What a message did, before amounts are resolved.
#[derive(Debug, Default)]
struct Draft {
    kind: Option<TransactionType>,
    sent: Vec<Coin>,
    received: Vec<Coin>,
    notes: Option<String>,
    tag: Option<&'static str>,
    keep_empty: bool,
}

impl Draft {
    fn new(kind: TransactionType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    fn sent(mut self, coins: Vec<Coin>) -> Self {
        self.sent = coins;
        self
    }

    fn received(mut self, coins: Vec<Coin>) -> Self {
        self.received = coins;
        self
    }

    fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Emit the record even when it moves nothing for the address.
    fn keep_empty(mut self) -> Self {
        self.keep_empty = true;
        self
    }
}

/// Classify one indexed transaction for `address`.
///
/// Failed transactions (`code != 0`) and recognized messages that do not
/// move value for the address yield `None`. Unrecognized messages always
/// yield an `Other` record carrying the coins the address spent and received
/// according to the transaction events.
pub fn classify_tx(
    tx: &TxResponse,
    address: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    if tx.code != 0 {
        debug!(tx_hash = %tx.txhash, code = tx.code, "Skipping failed transaction");
        return Ok(None);
    }
    let Some(message) = primary_message(tx.messages()) else {
        return Ok(None);
    };
    let type_url = str_field(message, "@type").unwrap_or_default();
    let date = classify::from_rfc3339(&tx.timestamp, &tx.txhash)?;

    let fee_coins = if pays_fee(tx, message, address) {
        tx.fee().map(|fee| fee.amount.as_slice()).unwrap_or_default()
    } else {
        &[]
    };

    let kind = MessageKind::from_type_url(type_url);
    let Some(draft) = draft_for(kind, type_url, message, tx, address, fee_coins) else {
        return Ok(None);
    };
    let fee = fee_coins.first().map(Coin::resolve).transpose()?;

    build(draft, date, &tx.txhash, fee)
}

fn draft_for(
    kind: MessageKind,
    type_url: &str,
    message: &Value,
    tx: &TxResponse,
    address: &str,
    fee_coins: &[Coin],
) -> Option<Draft> {
    let draft = match kind {
        MessageKind::Send => {
            let from = str_field(message, "from_address") == Some(address);
            let to = str_field(message, "to_address") == Some(address);
            let amount = coins_field(message, "amount");
            match (from, to) {
                (true, true) => Draft::new(TransactionType::Other).notes("Self-transfer"),
                (true, false) => Draft::new(TransactionType::Send).sent(amount),
                (false, true) => Draft::new(TransactionType::Receive).received(amount),
                (false, false) => return None,
            }
        }
        MessageKind::MultiSend => {
            let side = |key: &str| -> Vec<Coin> {
                message
                    .get(key)
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter(|entry| str_field(entry, "address") == Some(address))
                    .flat_map(|entry| coins_field(entry, "coins"))
                    .collect()
            };
            let inputs = side("inputs");
            if !inputs.is_empty() {
                Draft::new(TransactionType::Send).sent(inputs)
            } else {
                let outputs = side("outputs");
                if outputs.is_empty() {
                    return None;
                }
                Draft::new(TransactionType::Receive).received(outputs)
            }
        }
        MessageKind::Delegate => Draft::new(TransactionType::Stake)
            .sent(coin_field(message, "amount").into_iter().collect())
            .notes(format!(
                "Delegate to {}",
                str_field(message, "validator_address").unwrap_or("validator")
            )),
        MessageKind::Undelegate => Draft::new(TransactionType::Unstake)
            .received(coin_field(message, "amount").into_iter().collect())
            .notes(format!(
                "Undelegate from {}",
                str_field(message, "validator_address").unwrap_or("validator")
            )),
        MessageKind::Redelegate => Draft::new(TransactionType::Other)
            .tag("redelegate")
            .notes(format!(
                "Redelegate from {} to {}",
                str_field(message, "validator_src_address").unwrap_or("validator"),
                str_field(message, "validator_dst_address").unwrap_or("validator")
            )),
        MessageKind::WithdrawReward | MessageKind::WithdrawCommission => {
            let mut rewards = received_by(tx, address);
            if rewards.is_empty() {
                rewards = ["withdraw_rewards", "withdraw_commission"]
                    .iter()
                    .flat_map(|event_kind| tx.events_of(event_kind))
                    .filter_map(|event| event.attribute("amount"))
                    .flat_map(parse_coins)
                    .collect();
            }
            let label = if kind == MessageKind::WithdrawReward {
                "Staking rewards"
            } else {
                "Validator commission"
            };
            Draft::new(TransactionType::Claim).received(rewards).notes(label)
        }
        MessageKind::IbcTransfer => {
            if str_field(message, "sender") != Some(address) {
                return None;
            }
            Draft::new(TransactionType::Bridge)
                .sent(coin_field(message, "token").into_iter().collect())
                .notes(format!(
                    "IBC transfer to {} via {}",
                    str_field(message, "receiver").unwrap_or("unknown"),
                    str_field(message, "source_channel").unwrap_or("unknown channel")
                ))
        }
        MessageKind::IbcReceive => {
            let packet = tx
                .events_of("fungible_token_packet")
                .find(|event| event.attribute("receiver") == Some(address))?;
            let coin = Coin::new(packet.attribute("denom")?, packet.attribute("amount")?);
            Draft::new(TransactionType::Bridge).received(vec![coin]).notes(format!(
                "IBC receive from {}",
                packet.attribute("sender").unwrap_or("unknown")
            ))
        }
        MessageKind::Swap => {
            if str_field(message, "sender") != Some(address) {
                return None;
            }
            let hops: Vec<_> = tx.events_of("token_swapped").collect();
            let token_in = hops
                .first()
                .and_then(|hop| hop.attribute("tokens_in"))
                .map(parse_coins)
                .unwrap_or_else(|| coin_field(message, "token_in").into_iter().collect());
            let token_out = hops
                .last()
                .and_then(|hop| hop.attribute("tokens_out"))
                .map(parse_coins)
                .unwrap_or_else(|| coin_field(message, "token_out").into_iter().collect());
            Draft::new(TransactionType::Trade).sent(token_in).received(token_out)
        }
        MessageKind::JoinPool => {
            let pool = pool_id(message)?;
            let deposited = tx
                .events_of("pool_joined")
                .filter_map(|event| event.attribute("tokens_in"))
                .flat_map(parse_coins)
                .collect::<Vec<_>>();
            let deposited = if deposited.is_empty() {
                coins_field(message, "token_in_maxs")
            } else {
                deposited
            };
            let shares = str_field(message, "share_out_amount")
                .map(|amount| Coin::new(format!("gamm/pool/{pool}"), amount));
            Draft::new(TransactionType::LpAdd)
                .sent(deposited)
                .received(shares.into_iter().collect())
                .notes(format!("Join pool {pool}"))
        }
        MessageKind::ExitPool => {
            let pool = pool_id(message)?;
            let shares = str_field(message, "share_in_amount")
                .map(|amount| Coin::new(format!("gamm/pool/{pool}"), amount));
            let withdrawn = tx
                .events_of("pool_exited")
                .filter_map(|event| event.attribute("tokens_out"))
                .flat_map(parse_coins)
                .collect::<Vec<_>>();
            let withdrawn = if withdrawn.is_empty() {
                coins_field(message, "token_out_mins")
            } else {
                withdrawn
            };
            Draft::new(TransactionType::LpRemove)
                .sent(shares.into_iter().collect())
                .received(withdrawn)
                .notes(format!("Exit pool {pool}"))
        }
        MessageKind::Vote => Draft::new(TransactionType::Other)
            .tag("governance")
            .notes(format!(
                "Vote {} on proposal {}",
                str_field(message, "option").unwrap_or("cast"),
                scalar_field(message, "proposal_id").unwrap_or_else(|| "?".to_string())
            )),
        MessageKind::Grant => Draft::new(TransactionType::Approval).notes(format!(
            "Authz grant to {}",
            str_field(message, "grantee").unwrap_or("unknown")
        )),
        MessageKind::Unknown => Draft::new(TransactionType::Other)
            .sent(spent_by(tx, address, fee_coins))
            .received(received_by(tx, address))
            .notes(type_url)
            .keep_empty(),
    };
    Some(draft)
}

fn build(
    draft: Draft,
    date: DateTime<Utc>,
    tx_hash: &str,
    fee: Option<(BigDecimal, String)>,
) -> Result<Option<Transaction>, ClassificationError> {
    let kind = draft.kind.unwrap_or(TransactionType::Other);
    let mut builder = Transaction::builder(date, kind).tx_hash(tx_hash);

    for (index, (quantity, currency)) in merge_coins(&draft.sent)?.into_iter().enumerate() {
        builder = if index == 0 {
            builder.sent(quantity, currency)
        } else {
            builder.additional_sent(quantity, currency)
        };
    }
    for (index, (quantity, currency)) in merge_coins(&draft.received)?.into_iter().enumerate() {
        builder = if index == 0 {
            builder.received(quantity, currency)
        } else {
            builder.additional_received(quantity, currency)
        };
    }
    if let Some((quantity, currency)) = fee {
        builder = builder.fee(quantity, currency);
    }
    if let Some(notes) = draft.notes {
        builder = builder.notes(notes);
    }
    if let Some(tag) = draft.tag {
        builder = builder.tag(tag);
    }
    Ok(if draft.keep_empty {
        Some(builder.finish())
    } else {
        builder.build()
    })
}

/// Resolve coins and sum repeated symbols, keeping first-seen order and
/// dropping zero amounts.
fn merge_coins(coins: &[Coin]) -> Result<Vec<(BigDecimal, String)>, ClassificationError> {
    let mut merged: Vec<(BigDecimal, String)> = Vec::new();
    for coin in coins {
        let (quantity, symbol) = coin.resolve()?;
        match merged.iter_mut().find(|(_, s)| *s == symbol) {
            Some((total, _)) => *total += quantity,
            None => merged.push((quantity, symbol)),
        }
    }
    merged.retain(|(quantity, _)| !quantity.is_zero());
    Ok(merged)
}

fn primary_message(messages: &[Value]) -> Option<&Value> {
    messages
        .iter()
        .find(|m| str_field(m, "@type") != Some(MSG_UPDATE_CLIENT))
}

/// Whether the address paid the fee: the explicit fee payer, otherwise the
/// signer of the first message.
fn pays_fee(tx: &TxResponse, message: &Value, address: &str) -> bool {
    if let Some(payer) = tx.fee().map(|fee| fee.payer.as_str()).filter(|p| !p.is_empty()) {
        return payer == address;
    }
    let first = tx.messages().first().unwrap_or(message);
    signer(first) == Some(address)
}

fn signer(message: &Value) -> Option<&str> {
    ["from_address", "delegator_address", "sender", "voter", "granter", "signer"]
        .iter()
        .find_map(|key| str_field(message, key))
        .or_else(|| {
            message
                .get("inputs")
                .and_then(|inputs| inputs.get(0))
                .and_then(|input| str_field(input, "address"))
        })
}

/// Coins received by `address` according to `coin_received` events.
///
/// Older nodes put several receiver/amount pairs in one event, so attributes
/// are read in order.
fn received_by(tx: &TxResponse, address: &str) -> Vec<Coin> {
    let mut coins = Vec::new();
    for event in tx.events_of("coin_received") {
        let mut receiver_matches = false;
        for attribute in &event.attributes {
            match (attribute.key.as_str(), attribute.value.as_deref()) {
                ("receiver", value) => receiver_matches = value == Some(address),
                ("amount", Some(amount)) if receiver_matches => coins.extend(parse_coins(amount)),
                _ => {}
            }
        }
    }
    coins
}

/// Coins spent by `address` according to `coin_spent` events, leaving out
/// the fee deduction (`fee_coins`, empty when someone else paid).
fn spent_by(tx: &TxResponse, address: &str, fee_coins: &[Coin]) -> Vec<Coin> {
    let mut coins = Vec::new();
    let mut fee_pending = !fee_coins.is_empty();
    for event in tx.events_of("coin_spent") {
        let mut spender_matches = false;
        for attribute in &event.attributes {
            match (attribute.key.as_str(), attribute.value.as_deref()) {
                ("spender", value) => spender_matches = value == Some(address),
                ("amount", Some(amount)) if spender_matches => {
                    let spent = parse_coins(amount);
                    if fee_pending && spent == fee_coins {
                        fee_pending = false;
                    } else {
                        coins.extend(spent);
                    }
                }
                _ => {}
            }
        }
    }
    coins
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// A string or number field as text.
fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn pool_id(message: &Value) -> Option<String> {
    scalar_field(message, "pool_id")
}

fn coin_field(value: &Value, key: &str) -> Option<Coin> {
    serde_json::from_value(value.get(key)?.clone()).ok()
}

fn coins_field(value: &Value, key: &str) -> Vec<Coin> {
    value
        .get(key)
        .and_then(|coins| serde_json::from_value(coins.clone()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    const ME: &str = "cosmos1sender0000000000000000000000000000000";
    const THEM: &str = "cosmos1other00000000000000000000000000000000";

    fn tx(messages: Value, events: Value, code: u32) -> TxResponse {
        serde_json::from_value(json!({
            "txhash": "ABC123",
            "code": code,
            "timestamp": "2024-03-01T12:00:00Z",
            "tx": {
                "body": {"messages": messages, "memo": ""},
                "auth_info": {"fee": {"amount": [{"denom": "uatom", "amount": "5000"}], "payer": ""}}
            },
            "events": events
        }))
        .unwrap()
    }

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn bank_send_by_address_is_send_with_fee() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": ME,
                "to_address": THEM,
                "amount": [{"denom": "uatom", "amount": "1500000"}]
            }]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Send);
        assert_eq!(classified.sent.unwrap().quantity, dec("1.5"));
        assert_eq!(classified.fee.unwrap().quantity, dec("0.005"));
    }

    #[test]
    fn bank_send_to_address_is_receive_without_fee() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": THEM,
                "to_address": ME,
                "amount": [{"denom": "uatom", "amount": "2000000"}]
            }]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Receive);
        assert!(classified.fee.is_none());
    }

    #[test]
    fn failed_transaction_is_skipped() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": ME,
                "to_address": THEM,
                "amount": [{"denom": "uatom", "amount": "1"}]
            }]),
            json!([]),
            5,
        );
        assert!(classify_tx(&tx, ME).unwrap().is_none());
    }

    #[test]
    fn unknown_message_is_other_with_type_in_notes() {
        let tx = tx(
            json!([{"@type": "/cosmwasm.wasm.v1.MsgExecuteContract", "sender": ME}]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Other);
        assert_eq!(
            classified.notes.as_deref(),
            Some("/cosmwasm.wasm.v1.MsgExecuteContract")
        );
    }

    #[test]
    fn unknown_message_keeps_coins_received_from_events() {
        let tx = tx(
            json!([{"@type": "/cosmwasm.wasm.v1.MsgExecuteContract", "sender": THEM}]),
            json!([
                {"type": "coin_spent", "attributes": [
                    {"key": "spender", "value": THEM}, {"key": "amount", "value": "2500000uatom"}
                ]},
                {"type": "coin_received", "attributes": [
                    {"key": "receiver", "value": ME}, {"key": "amount", "value": "2500000uatom"}
                ]}
            ]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Other);
        let received = classified.received.unwrap();
        assert_eq!(received.quantity, dec("2.5"));
        assert_eq!(received.currency, "ATOM");
        assert!(classified.sent.is_none());
        assert!(classified.fee.is_none());
        assert_eq!(
            classified.notes.as_deref(),
            Some("/cosmwasm.wasm.v1.MsgExecuteContract")
        );
    }

    #[test]
    fn unknown_message_keeps_coins_spent_apart_from_the_fee() {
        let tx = tx(
            json!([{"@type": "/cosmwasm.wasm.v1.MsgExecuteContract", "sender": ME}]),
            json!([
                {"type": "coin_spent", "attributes": [
                    {"key": "spender", "value": ME}, {"key": "amount", "value": "5000uatom"}
                ]},
                {"type": "coin_spent", "attributes": [
                    {"key": "spender", "value": ME}, {"key": "amount", "value": "7000000uatom"}
                ]},
                {"type": "coin_received", "attributes": [
                    {"key": "receiver", "value": THEM}, {"key": "amount", "value": "7000000uatom"}
                ]}
            ]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Other);
        assert_eq!(classified.sent.unwrap().quantity, dec("7"));
        assert!(classified.received.is_none());
        assert_eq!(classified.fee.unwrap().quantity, dec("0.005"));
    }

    #[test]
    fn unknown_message_without_value_is_still_recorded() {
        let tx = tx(
            json!([{"@type": "/cosmos.feegrant.v1beta1.MsgGrantAllowance", "granter": THEM}]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Other);
        assert!(classified.sent.is_none() && classified.received.is_none() && classified.fee.is_none());
        assert_eq!(
            classified.notes.as_deref(),
            Some("/cosmos.feegrant.v1beta1.MsgGrantAllowance")
        );
    }

    #[test]
    fn reward_claim_reads_received_coins_from_events() {
        let tx = tx(
            json!([
                {"@type": "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward", "delegator_address": ME, "validator_address": "cosmosvaloper1a"},
                {"@type": "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward", "delegator_address": ME, "validator_address": "cosmosvaloper1b"}
            ]),
            json!([
                {"type": "coin_received", "attributes": [
                    {"key": "receiver", "value": ME}, {"key": "amount", "value": "120000uatom"}
                ]},
                {"type": "coin_received", "attributes": [
                    {"key": "receiver", "value": "cosmos1feecollector"}, {"key": "amount", "value": "5000uatom"}
                ]},
                {"type": "coin_received", "attributes": [
                    {"key": "receiver", "value": ME}, {"key": "amount", "value": "30000uatom"}
                ]}
            ]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Claim);
        assert_eq!(classified.received.unwrap().quantity, dec("0.15"));
        assert_eq!(classified.fee.unwrap().quantity, dec("0.005"));
    }

    #[test]
    fn osmosis_swap_is_trade_with_output_from_events() {
        let tx = tx(
            json!([{
                "@type": "/osmosis.poolmanager.v1beta1.MsgSwapExactAmountIn",
                "sender": ME,
                "routes": [{"pool_id": "1", "token_out_denom": "uatom"}],
                "token_in": {"denom": "uosmo", "amount": "10000000"},
                "token_out_min_amount": "1"
            }]),
            json!([
                {"type": "token_swapped", "attributes": [
                    {"key": "tokens_in", "value": "10000000uosmo"},
                    {"key": "tokens_out", "value": "812345ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"}
                ]}
            ]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Trade);
        assert_eq!(classified.sent.as_ref().unwrap().currency, "OSMO");
        let received = classified.received.unwrap();
        assert_eq!(received.currency, "ATOM");
        assert_eq!(received.quantity, dec("0.812345"));
    }

    #[test]
    fn ibc_receive_skips_client_update() {
        let tx = tx(
            json!([
                {"@type": "/ibc.core.client.v1.MsgUpdateClient", "signer": "osmo1relayer"},
                {"@type": "/ibc.core.channel.v1.MsgRecvPacket", "signer": "osmo1relayer"}
            ]),
            json!([
                {"type": "fungible_token_packet", "attributes": [
                    {"key": "sender", "value": "cosmos1abc"},
                    {"key": "receiver", "value": ME},
                    {"key": "denom", "value": "transfer/channel-0/uatom"},
                    {"key": "amount", "value": "3000000"}
                ]}
            ]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Bridge);
        assert_eq!(classified.received.unwrap().quantity, dec("3"));
        assert!(classified.fee.is_none());
    }

    #[test]
    fn delegate_is_stake() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.staking.v1beta1.MsgDelegate",
                "delegator_address": ME,
                "validator_address": "cosmosvaloper1xyz",
                "amount": {"denom": "uatom", "amount": "25000000"}
            }]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Stake);
        assert_eq!(classified.sent.unwrap().quantity, dec("25"));
        assert_eq!(classified.notes.as_deref(), Some("Delegate to cosmosvaloper1xyz"));
    }

    #[test]
    fn vote_is_tagged_governance() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.gov.v1.MsgVote",
                "voter": ME,
                "proposal_id": "912",
                "option": "VOTE_OPTION_YES"
            }]),
            json!([]),
            0,
        );
        let classified = classify_tx(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Other);
        assert_eq!(classified.tag.as_deref(), Some("governance"));
        assert!(classified.notes.unwrap().contains("912"));
    }

    #[test]
    fn classification_is_deterministic() {
        let tx = tx(
            json!([{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": ME,
                "to_address": THEM,
                "amount": [{"denom": "uatom", "amount": "7"}, {"denom": "uosmo", "amount": "9"}]
            }]),
            json!([]),
            0,
        );
        let first = classify_tx(&tx, ME).unwrap();
        assert_eq!(first, classify_tx(&tx, ME).unwrap());
        assert_eq!(first.unwrap().additional_sent.len(), 1);
    }
}
