//! Cache domain - deterministic key construction for memoized remote calls

mod key;

pub use key::CacheKey;
