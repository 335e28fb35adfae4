//! Public traits for disposal and service resolution.

mod dispose;
pub(crate) mod resolve;

pub use dispose::Dispose;
pub use resolve::{Resolve, ResolverCore};
