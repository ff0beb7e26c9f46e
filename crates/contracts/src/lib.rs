pub mod alloy;

pub use self::alloy::MultiAuction;
