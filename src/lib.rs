//! Bloom filters and multi-level filter cascades.
//!
//! [`BitFilter`] is a plain bloom filter whose byte layout and hashing
//! (MurmurHash3 x86_32, seed = hash function index) are fixed, so a serialized
//! filter means the same thing to every reader. [`FilterCascade`] chains
//! filters so that a small target set is recognised exactly while the rest of
//! a much larger candidate set is rejected.
//!
//! ```
//! use bloom_cascade::{BitFilter, Filter, FilterCascade};
//!
//! let mut filter = BitFilter::new(3, 0.01);
//! filter.insert(b"stored");
//! assert!(filter.contains(b"stored"));
//!
//! let revoked: Vec<[u8; 4]> = (0u32..10).map(u32::to_be_bytes).collect();
//! let issued: Vec<[u8; 4]> = (0u32..1000).map(u32::to_be_bytes).collect();
//! let cascade = FilterCascade::build(&revoked, &issued, revoked.len(), issued.len(), 0.5)?;
//! assert!(revoked.iter().all(|x| cascade.contains(x)));
//! # Ok::<(), bloom_cascade::CascadeError>(())
//! ```

pub mod bloom_filters;
pub mod cascade;
pub mod config;
pub mod error;
pub mod hash;
pub mod record;

pub use bloom_filters::{BitFilter, Filter};
pub use cascade::FilterCascade;
pub use config::{CascadeConfig, CascadeConfigBuilder};
pub use error::{CascadeError, FilterError};
pub use record::{CascadeRecord, FilterRecord};
