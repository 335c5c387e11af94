//! Postgres repositories
//
// Ad repository (ads, ad_tactics, ad_shots)
pub mod ad;
//
// Transaction utilities
pub mod transaction;

pub use ad::AdRepository;
pub use transaction::TransactionGuard;
