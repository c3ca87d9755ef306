use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte chain identifier (coin id, launcher id, asset id, puzzle hash), hex-encoded at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id32(pub [u8; 32]);

impl Id32 {
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Id32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Which router variant a pair belongs to (base XCH-paired CATs vs restricted-CAT router).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterVariant {
    Base,
    RestrictedCat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub launcher_id: Id32,
    pub current_coin_id: Id32,
    pub variant: RouterVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub launcher_id: Id32,
    pub asset_id: Id32,
    pub name: String,
    pub short_name: String,
    pub image_url: String,
    pub current_coin_id: Id32,
    pub xch_reserve: u128,
    pub token_reserve: u128,
    pub liquidity: u128,
    pub trade_volume: u128,
    pub trade_volume_usd: u128,
    pub last_tx_index: i64,
}

impl Pair {
    #[must_use]
    pub fn new_default(launcher_id: Id32, asset_id: Id32, current_coin_id: Id32) -> Self {
        let short_asset = &asset_id.to_hex()[..8];
        Self {
            launcher_id,
            asset_id,
            name: format!("CAT 0x{short_asset}"),
            short_name: "???".to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            current_coin_id,
            xch_reserve: 0,
            token_reserve: 0,
            liquidity: 0,
            trade_volume: 0,
            trade_volume_usd: 0,
            last_tx_index: -1,
        }
    }
}

pub const DEFAULT_IMAGE_URL: &str = "https://icons.dexie.space/unknown.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

impl Operation {
    /// Classifies the operation per the sign of the liquidity delta.
    #[must_use]
    pub fn classify(delta_liquidity: i128) -> Self {
        match delta_liquidity.cmp(&0) {
            std::cmp::Ordering::Equal => Self::Swap,
            std::cmp::Ordering::Greater => Self::AddLiquidity,
            std::cmp::Ordering::Less => Self::RemoveLiquidity,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Swap => "SWAP",
            Self::AddLiquidity => "ADD_LIQUIDITY",
            Self::RemoveLiquidity => "REMOVE_LIQUIDITY",
        };
        write!(f, "{s}")
    }
}

/// Reserve triple curried/evaluated out of a pair's inner puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveState {
    pub xch_reserve: u128,
    pub token_reserve: u128,
    pub liquidity: u128,
}

/// Signed delta between two reserve states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub xch: i128,
    pub token: i128,
    pub liquidity: i128,
}

impl StateChange {
    #[must_use]
    pub fn between(old: ReserveState, new: ReserveState) -> Self {
        Self {
            xch: new.xch_reserve as i128 - old.xch_reserve as i128,
            token: new.token_reserve as i128 - old.token_reserve as i128,
            liquidity: new.liquidity as i128 - old.liquidity as i128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub coin_id: Id32,
    pub pair_launcher_id: Id32,
    pub operation: Operation,
    pub state_change: StateChange,
    pub new_state: ReserveState,
    pub height: u32,
    pub pair_tx_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightToTimestamp {
    pub height: u32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageUsdPrice {
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub price_cents: i64,
}

impl AverageUsdPrice {
    /// TibetSwap v2 launch epoch, used as the sync floor when no data exists yet.
    pub const DEFAULT_SYNC_EPOCH: i64 = 1_684_130_400;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    pub short_name: String,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_swap_has_zero_liquidity_delta() {
        assert_eq!(Operation::classify(0), Operation::Swap);
    }

    #[test]
    fn classify_add_liquidity_is_positive_delta() {
        assert_eq!(Operation::classify(136), Operation::AddLiquidity);
    }

    #[test]
    fn classify_remove_liquidity_is_negative_delta() {
        assert_eq!(Operation::classify(-136), Operation::RemoveLiquidity);
    }

    #[test]
    fn state_change_between_matches_reserve_deltas() {
        let old = ReserveState { xch_reserve: 1100, token_reserve: 1818, liquidity: 1414 };
        let new = ReserveState { xch_reserve: 1210, token_reserve: 2000, liquidity: 1550 };
        let change = StateChange::between(old, new);
        assert_eq!(change, StateChange { xch: 110, token: 182, liquidity: 136 });
        assert_eq!(Operation::classify(change.liquidity), Operation::AddLiquidity);
    }

    #[test]
    fn pair_new_default_uses_placeholder_metadata() {
        let asset_id = Id32([0xBBu8; 32]);
        let pair = Pair::new_default(Id32([1u8; 32]), asset_id, Id32([1u8; 32]));
        assert_eq!(pair.name, "CAT 0xbbbbbbbb");
        assert_eq!(pair.short_name, "???");
        assert_eq!(pair.last_tx_index, -1);
        assert_eq!(pair.xch_reserve, 0);
    }
}
