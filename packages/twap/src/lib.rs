pub mod error;
pub mod helper;
pub mod math;
pub mod oracle;
pub mod pool_manager;
pub mod record;

pub use error::ValidationError;
pub use record::{lexicographical_order_denoms, unique_denom_pairs, DenomPair, TwapRecord};
