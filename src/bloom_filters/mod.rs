mod base;
mod bit_filter;

pub use self::base::{Filter, MAX_FILTER_BYTES, MAX_HASH_FUNCS, MIN_HASH_FUNCS};
pub use self::bit_filter::BitFilter;
