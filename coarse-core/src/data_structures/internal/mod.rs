//! Internal implementation details.
//!
//! The chain is only reachable through the locks of the set types; only the
//! sentinel keys are exported.
//!
//! ```compile_fail
//! use coarse_core::data_structures::internal::sorted_chain::SortedChain;
//! ```

pub(crate) mod sorted_chain;

pub(crate) use sorted_chain::SortedChain;
pub use sorted_chain::{HEAD_KEY, TAIL_KEY, is_reserved};
