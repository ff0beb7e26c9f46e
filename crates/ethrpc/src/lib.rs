pub mod alloy;

use ::alloy::providers::DynProvider;

/// Type erased provider every component talks to the node through.
pub type AlloyProvider = DynProvider;
