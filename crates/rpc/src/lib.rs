pub mod fire_academy;
pub mod metadata;
pub mod price;

pub use fire_academy::FireAcademyRpcClient;
pub use metadata::DexieMetadataClient;
pub use price::CryptoCompareClient;
