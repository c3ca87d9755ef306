mod height_repo;
mod pair_repo;
mod price_repo;
mod router_repo;
mod transaction_repo;

pub use height_repo::HeightRepository;
pub use pair_repo::PairRepository;
pub use price_repo::PriceRepository;
pub use router_repo::RouterRepository;
pub use transaction_repo::TransactionRepository;
