pub mod pair_walker;
pub mod router_walker;
pub mod spend_decoder;
pub mod timestamp_resolver;
pub mod usd_price_sync;

pub use pair_walker::{PairWalkOutcome, PairWalker};
pub use router_walker::RouterWalker;
pub use timestamp_resolver::TimestampResolver;
pub use usd_price_sync::{UsdPriceSynchronizer, SETTLE_WINDOW_SECS};
