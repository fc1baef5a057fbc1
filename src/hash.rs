//! Seeded hashing shared by every filter level.
//!
//! Hash function `i` of a filter is MurmurHash3 (x86, 32-bit) seeded with `i`
//! and nothing else. Keeping the seed rule this plain is what makes the bit
//! layout of a serialized filter reproducible by any other implementation.

use std::io::Cursor;

/// MurmurHash3 x86_32 of `data` with the given seed.
pub fn seeded_hash32(seed: u32, data: &[u8]) -> u32 {
    // reading from an in-memory slice cannot fail
    murmur3::murmur3_32(&mut Cursor::new(data), seed).unwrap_or(0)
}
