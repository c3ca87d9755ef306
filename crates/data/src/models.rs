//! Row shapes as persisted in SQLite and their conversions to/from domain types.
//!
//! `u128` reserve/volume quantities are stored as `TEXT`-encoded decimal
//! integers to avoid overflowing SQLite's 64-bit `INTEGER` columns; they are
//! parsed back into native `u128`/`i128` at the store boundary so business
//! logic never touches the text representation (§9's open-question resolution).

use anyhow::{Context, Result};
use tibet_indexer_core::domain::{
    AverageUsdPrice, HeightToTimestamp, Id32, Operation, Pair, ReserveState, Router, RouterVariant,
    StateChange, Transaction,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouterRow {
    pub launcher_id: String,
    pub current_coin_id: String,
    pub variant: String,
}

impl RouterRow {
    pub fn into_domain(self) -> Result<Router> {
        Ok(Router {
            launcher_id: parse_id32(&self.launcher_id)?,
            current_coin_id: parse_id32(&self.current_coin_id)?,
            variant: parse_variant(&self.variant)?,
        })
    }

    #[must_use]
    pub fn from_domain(router: &Router) -> Self {
        Self {
            launcher_id: router.launcher_id.to_hex(),
            current_coin_id: router.current_coin_id.to_hex(),
            variant: variant_tag(router.variant).to_string(),
        }
    }
}

fn variant_tag(variant: RouterVariant) -> &'static str {
    match variant {
        RouterVariant::Base => "base",
        RouterVariant::RestrictedCat => "rcat",
    }
}

fn parse_variant(s: &str) -> Result<RouterVariant> {
    match s {
        "base" => Ok(RouterVariant::Base),
        "rcat" => Ok(RouterVariant::RestrictedCat),
        other => anyhow::bail!("unknown router variant {other}"),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PairRow {
    pub launcher_id: String,
    pub asset_id: String,
    pub name: String,
    pub short_name: String,
    pub image_url: String,
    pub current_coin_id: String,
    pub xch_reserve: String,
    pub token_reserve: String,
    pub liquidity: String,
    pub trade_volume: String,
    pub trade_volume_usd: String,
    pub last_tx_index: i64,
}

impl PairRow {
    pub fn into_domain(self) -> Result<Pair> {
        Ok(Pair {
            launcher_id: parse_id32(&self.launcher_id)?,
            asset_id: parse_id32(&self.asset_id)?,
            name: self.name,
            short_name: self.short_name,
            image_url: self.image_url,
            current_coin_id: parse_id32(&self.current_coin_id)?,
            xch_reserve: parse_u128(&self.xch_reserve)?,
            token_reserve: parse_u128(&self.token_reserve)?,
            liquidity: parse_u128(&self.liquidity)?,
            trade_volume: parse_u128(&self.trade_volume)?,
            trade_volume_usd: parse_u128(&self.trade_volume_usd)?,
            last_tx_index: self.last_tx_index,
        })
    }

    #[must_use]
    pub fn from_domain(pair: &Pair) -> Self {
        Self {
            launcher_id: pair.launcher_id.to_hex(),
            asset_id: pair.asset_id.to_hex(),
            name: pair.name.clone(),
            short_name: pair.short_name.clone(),
            image_url: pair.image_url.clone(),
            current_coin_id: pair.current_coin_id.to_hex(),
            xch_reserve: pair.xch_reserve.to_string(),
            token_reserve: pair.token_reserve.to_string(),
            liquidity: pair.liquidity.to_string(),
            trade_volume: pair.trade_volume.to_string(),
            trade_volume_usd: pair.trade_volume_usd.to_string(),
            last_tx_index: pair.last_tx_index,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub coin_id: String,
    pub pair_launcher_id: String,
    pub operation: String,
    pub state_change: String,
    pub new_state: String,
    pub height: i64,
    pub pair_tx_index: i64,
}

impl TransactionRow {
    pub fn into_domain(self) -> Result<Transaction> {
        Ok(Transaction {
            coin_id: parse_id32(&self.coin_id)?,
            pair_launcher_id: parse_id32(&self.pair_launcher_id)?,
            operation: parse_operation(&self.operation)?,
            state_change: parse_state_change(&self.state_change)?,
            new_state: parse_reserve_state(&self.new_state)?,
            height: self.height as u32,
            pair_tx_index: self.pair_tx_index,
        })
    }

    #[must_use]
    pub fn from_domain(tx: &Transaction) -> Self {
        Self {
            coin_id: tx.coin_id.to_hex(),
            pair_launcher_id: tx.pair_launcher_id.to_hex(),
            operation: operation_tag(tx.operation).to_string(),
            state_change: serialize_state_change(tx.state_change),
            new_state: serialize_reserve_state(tx.new_state),
            height: i64::from(tx.height),
            pair_tx_index: tx.pair_tx_index,
        }
    }
}

fn operation_tag(op: Operation) -> &'static str {
    match op {
        Operation::Swap => "SWAP",
        Operation::AddLiquidity => "ADD_LIQUIDITY",
        Operation::RemoveLiquidity => "REMOVE_LIQUIDITY",
    }
}

fn parse_operation(s: &str) -> Result<Operation> {
    match s {
        "SWAP" => Ok(Operation::Swap),
        "ADD_LIQUIDITY" => Ok(Operation::AddLiquidity),
        "REMOVE_LIQUIDITY" => Ok(Operation::RemoveLiquidity),
        other => anyhow::bail!("unknown operation {other}"),
    }
}

#[must_use]
pub fn serialize_reserve_state(state: ReserveState) -> String {
    serde_json::json!({
        "xch": state.xch_reserve.to_string(),
        "token": state.token_reserve.to_string(),
        "liquidity": state.liquidity.to_string(),
    })
    .to_string()
}

pub fn parse_reserve_state(text: &str) -> Result<ReserveState> {
    let v: serde_json::Value = serde_json::from_str(text).context("invalid reserve state JSON")?;
    Ok(ReserveState {
        xch_reserve: json_u128(&v, "xch")?,
        token_reserve: json_u128(&v, "token")?,
        liquidity: json_u128(&v, "liquidity")?,
    })
}

#[must_use]
pub fn serialize_state_change(change: StateChange) -> String {
    serde_json::json!({
        "xch": change.xch.to_string(),
        "token": change.token.to_string(),
        "liquidity": change.liquidity.to_string(),
    })
    .to_string()
}

pub fn parse_state_change(text: &str) -> Result<StateChange> {
    let v: serde_json::Value = serde_json::from_str(text).context("invalid state change JSON")?;
    Ok(StateChange {
        xch: json_i128(&v, "xch")?,
        token: json_i128(&v, "token")?,
        liquidity: json_i128(&v, "liquidity")?,
    })
}

fn json_u128(v: &serde_json::Value, field: &str) -> Result<u128> {
    v.get(field)
        .and_then(serde_json::Value::as_str)
        .context("missing field")?
        .parse()
        .with_context(|| format!("field {field} is not a valid u128"))
}

fn json_i128(v: &serde_json::Value, field: &str) -> Result<i128> {
    v.get(field)
        .and_then(serde_json::Value::as_str)
        .context("missing field")?
        .parse()
        .with_context(|| format!("field {field} is not a valid i128"))
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct HeightRow {
    pub height: i64,
    pub timestamp: i64,
}

impl HeightRow {
    #[must_use]
    pub fn into_domain(self) -> HeightToTimestamp {
        HeightToTimestamp {
            height: self.height as u32,
            timestamp: self.timestamp,
        }
    }

    #[must_use]
    pub fn from_domain(row: HeightToTimestamp) -> Self {
        Self {
            height: i64::from(row.height),
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct PriceRow {
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub price_cents: i64,
}

impl PriceRow {
    #[must_use]
    pub fn into_domain(self) -> AverageUsdPrice {
        AverageUsdPrice {
            from_timestamp: self.from_timestamp,
            to_timestamp: self.to_timestamp,
            price_cents: self.price_cents,
        }
    }

    #[must_use]
    pub fn from_domain(row: AverageUsdPrice) -> Self {
        Self {
            from_timestamp: row.from_timestamp,
            to_timestamp: row.to_timestamp,
            price_cents: row.price_cents,
        }
    }
}

fn parse_id32(hex_str: &str) -> Result<Id32> {
    Id32::from_hex(hex_str).with_context(|| format!("invalid hex id {hex_str}"))
}

fn parse_u128(text: &str) -> Result<u128> {
    text.parse().with_context(|| format!("invalid u128 {text}"))
}
