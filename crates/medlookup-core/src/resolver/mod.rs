//! Medicine query resolver.
//!
//! Pipeline: Intent Extraction → Normalization → Layered Lookup → Alternatives

mod alternatives;
mod intent;
mod matcher;
mod normalizer;
mod similarity;

pub use alternatives::*;
pub use intent::*;
pub use matcher::*;
pub use normalizer::*;
pub use similarity::*;

use thiserror::Error;

use crate::store::StoreError;

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ResolverError {
    pub fn is_transient(&self) -> bool {
        match self {
            ResolverError::Store(e) => e.is_transient(),
        }
    }
}

pub type ResolverResult<T> = Result<T, ResolverError>;
