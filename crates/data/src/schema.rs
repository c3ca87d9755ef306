//! SQLite DDL, applied idempotently on store construction.

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS router (
    launcher_id TEXT PRIMARY KEY,
    current_coin_id TEXT NOT NULL,
    variant TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pairs (
    launcher_id TEXT PRIMARY KEY,
    asset_id TEXT NOT NULL,
    name TEXT NOT NULL,
    short_name TEXT NOT NULL,
    image_url TEXT NOT NULL,
    current_coin_id TEXT NOT NULL,
    xch_reserve TEXT NOT NULL,
    token_reserve TEXT NOT NULL,
    liquidity TEXT NOT NULL,
    trade_volume TEXT NOT NULL,
    trade_volume_usd TEXT NOT NULL,
    last_tx_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    coin_id TEXT PRIMARY KEY,
    pair_launcher_id TEXT NOT NULL,
    operation TEXT NOT NULL,
    state_change TEXT NOT NULL,
    new_state TEXT NOT NULL,
    height INTEGER NOT NULL,
    pair_tx_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_pair ON transactions (pair_launcher_id, pair_tx_index);
CREATE INDEX IF NOT EXISTS idx_transactions_height ON transactions (height);

CREATE TABLE IF NOT EXISTS height_to_timestamp (
    height INTEGER PRIMARY KEY,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_height_timestamp ON height_to_timestamp (timestamp);

CREATE TABLE IF NOT EXISTS average_usd_price (
    from_timestamp INTEGER PRIMARY KEY,
    to_timestamp INTEGER NOT NULL,
    price_cents INTEGER NOT NULL
);
"#;
