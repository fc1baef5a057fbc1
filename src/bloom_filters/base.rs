use std::f64::consts::LN_2;

pub const MIN_HASH_FUNCS: u32 = 1;
pub const MAX_HASH_FUNCS: u32 = 50;
/// Largest filter a 32-bit hash can address (2^32 bits), in bytes.
pub const MAX_FILTER_BYTES: usize = 1 << 29;

pub trait Filter {
    fn insert(&mut self, value: &[u8]);
    fn contains(&self, value: &[u8]) -> bool;
    fn clear(&mut self);
    /// size of the bit array in bytes
    fn get_size(&self) -> usize;

    /// m = -(nlε/(ln2)^2) where ε is desired false positive probability,
    /// in our case it is indicated by the letter f.
    /// Returned in whole bytes, rounded down and capped at MAX_FILTER_BYTES.
    /// A rate outside (0, 1) or a NaN input sizes to zero bytes.
    fn calculate_m(f: f64, n: f64) -> usize {
        let size = -1.0 / LN_2.powi(2) * n * f.ln();
        if !(f > 0.0 && size > 0.0) {
            return 0;
        }
        (size / 8.0).floor().min(MAX_FILTER_BYTES as f64) as usize
    }

    /// k = m/n * ln2, clamped to [MIN_HASH_FUNCS, MAX_HASH_FUNCS]
    fn calculate_k(byte_len: usize, n: f64) -> u32 {
        // NaN (empty filter sized for nothing) casts to 0 and lands on the minimum
        let k = (byte_len as f64 * 8.0 / n * LN_2).floor() as u32;
        k.clamp(MIN_HASH_FUNCS, MAX_HASH_FUNCS)
    }
}
