use std::fmt;

use bit_vec::BitVec;
use serde_json::Value;
use tracing::trace;

use crate::bloom_filters::base::MAX_HASH_FUNCS;
use crate::bloom_filters::Filter;
use crate::error::FilterError;
use crate::hash::seeded_hash32;
use crate::record::FilterRecord;

/// Fixed-size bit array probed by `k` seeded MurmurHash3 functions.
///
/// Bit `i` of the filter lives in byte `i / 8` under mask `1 << (i % 8)`, so
/// the bytes returned by [`BitFilter::as_bytes`] can be loaded by any other
/// implementation of the same record format. A filter with zero bytes is a
/// valid, always-empty filter.
#[derive(Clone, Debug)]
pub struct BitFilter {
    storage: BitVec,
    /// number of hash functions
    k: u32,

    // bookkeeping, carried into the serialized record only
    elements: Option<u64>,
    fp_rate: Option<f64>,
    level: Option<u32>,
}

impl BitFilter {
    /// n -- number of elements to insert
    /// f -- the false positive rate
    pub fn new(n: u32, f: f64) -> Self {
        Self::with_capacity(n as f64, f)
    }

    /// Same as [`BitFilter::new`] for a fractional expected element count,
    /// which is what the geometrically shrinking cascade levels ask for.
    ///
    /// Never fails: a rate outside (0, 1) or a capacity too small to fill a
    /// byte gives a zero-byte filter, and huge capacities are capped at
    /// [`MAX_FILTER_BYTES`](crate::bloom_filters::MAX_FILTER_BYTES).
    pub fn with_capacity(n: f64, f: f64) -> Self {
        Self::with_byte_len(Self::calculate_m(f, n), n, f)
    }

    /// Filter of exactly `byte_len` bytes, hash count chosen for `n` elements.
    pub(crate) fn with_byte_len(byte_len: usize, n: f64, f: f64) -> Self {
        Self {
            storage: BitVec::from_elem(byte_len * 8, false),
            k: Self::calculate_k(byte_len, n),
            elements: Some(n.ceil() as u64),
            fp_rate: Some(f),
            level: None,
        }
    }

    /// Rebuild a filter from its record, bit for bit.
    pub fn from_record(record: FilterRecord) -> Result<Self, FilterError> {
        let data = record.data.ok_or(FilterError::MissingFilterData)?;
        let k = match record.hash_func_count {
            None | Some(0) => return Err(FilterError::MissingHashFuncCount),
            Some(count) if count > MAX_HASH_FUNCS => {
                return Err(FilterError::HashFuncCountExceedsMax {
                    count,
                    max: MAX_HASH_FUNCS,
                })
            }
            Some(count) => count,
        };
        trace!(bytes = data.len(), hash_funcs = k, "loaded filter from record");
        Ok(Self {
            storage: BitVec::from_bytes(&data),
            k,
            elements: record.elements,
            fp_rate: record.fp_rate,
            level: record.level,
        })
    }

    pub fn from_value(value: Value) -> Result<Self, FilterError> {
        Self::from_record(FilterRecord::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        Self::from_record(FilterRecord::from_json(json)?)
    }

    pub fn to_record(&self) -> FilterRecord {
        FilterRecord {
            data: Some(self.as_bytes()),
            hash_func_count: Some(self.k),
            elements: self.elements,
            fp_rate: self.fp_rate,
            level: self.level,
        }
    }

    pub fn to_json(&self) -> Result<String, FilterError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Bit position selected by hash function `n_hash_num` for `value`,
    /// `None` for a zero-byte filter.
    pub fn hash(&self, n_hash_num: u32, value: &[u8]) -> Option<usize> {
        let h = seeded_hash32(n_hash_num, value) as u64;
        h.checked_rem(self.storage.len() as u64).map(|pos| pos as usize)
    }

    pub fn hash_funcs(&self) -> u32 {
        self.k
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = Some(level);
    }

    /// Raw filter bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.storage.to_bytes()
    }

    // BitVec orders bits most significant first within a byte; the filter
    // layout is least significant first, hence the flip of the low three bits.
    fn slot(position: usize) -> usize {
        position ^ 7
    }
}

impl Filter for BitFilter {
    fn insert(&mut self, value: &[u8]) {
        for i in 0..self.k {
            match self.hash(i, value) {
                Some(pos) => self.storage.set(Self::slot(pos), true),
                None => return,
            }
        }
    }

    fn contains(&self, value: &[u8]) -> bool {
        if self.storage.is_empty() {
            return false;
        }
        for i in 0..self.k {
            let idx = self.hash(i, value).map(Self::slot);
            if idx.and_then(|idx| self.storage.get(idx)) != Some(true) {
                return false;
            }
        }
        true
    }

    fn clear(&mut self) {
        self.storage.clear();
    }

    fn get_size(&self) -> usize {
        self.storage.len() / 8
    }
}

/// Filters are equal when their bits and hash function count match;
/// bookkeeping fields are ignored.
impl PartialEq for BitFilter {
    fn eq(&self, other: &Self) -> bool {
        self.k == other.k && self.storage == other.storage
    }
}

impl Eq for BitFilter {}

impl fmt::Display for BitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self
            .as_bytes()
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "<BloomFilter:{} nHashFuncs:{}>", bytes, self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom_filters::MAX_FILTER_BYTES;
    use proptest::prelude::*;
    use rand::distributions::Uniform;
    use rand::{thread_rng, Rng};
    use serde_json::json;
    use std::collections::HashSet;

    // test data from bitcoind's bloom tests
    const A: &str = "99108ad8ed9bb6274d3980bab5a85c048f0950c8";
    const B: &str = "19108ad8ed9bb6274d3980bab5a85c048f0950c8";
    const C: &str = "b5a2c786d9ef4658287ced5914b37a1b4aa32eee";
    const D: &str = "b9300670b4c5366e95b2699e8b18bc75e5f729c5";

    fn bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn sizing() {
        // elements, fp rate, expected bytes, expected hash funcs
        let cases = [
            (2, 0.001, 3, 8),
            (3, 0.01, 3, 5),
            (10, 0.2, 4, 2),
            (100, 0.2, 41, 2),
            (10000, 0.3, 3132, 1),
        ];
        for (n, f, len, k) in cases {
            let bf = BitFilter::new(n, f);
            assert_eq!(bf.get_size(), len, "byte length for n={} f={}", n, f);
            assert_eq!(bf.hash_funcs(), k, "hash funcs for n={} f={}", n, f);
        }
    }

    #[test]
    fn hash_funcs_clamp_to_max() {
        let bf = BitFilter::new(10, 0.0000000000000001);
        assert_eq!(bf.hash_funcs(), MAX_HASH_FUNCS);
    }

    #[test]
    fn degenerate_filter_contains_nothing() {
        let mut bf = BitFilter::with_capacity(0.0, 0.01);
        assert_eq!(bf.get_size(), 0);
        assert_eq!(bf.hash_funcs(), 1);
        bf.insert(&bytes(A));
        assert!(!bf.contains(&bytes(A)));
        assert!(!bf.contains(b""));

        let bf = BitFilter::new(10, 0.99);
        assert_eq!(bf.get_size(), 0);
        assert!(!bf.contains(&1u32.to_be_bytes()));
    }

    #[test]
    fn out_of_range_rates_give_empty_filters() {
        for f in [0.0, -0.5, f64::NAN, 1.0, 2.0] {
            let bf = BitFilter::new(10, f);
            assert_eq!(bf.get_size(), 0, "byte length for f={}", f);
            assert_eq!(bf.hash_funcs(), 1, "hash funcs for f={}", f);
            assert!(!bf.contains(&bytes(A)));
        }
    }

    #[test]
    fn huge_capacities_are_capped() {
        assert_eq!(BitFilter::calculate_m(0.01, 1e12), MAX_FILTER_BYTES);
        assert_eq!(BitFilter::calculate_m(0.01, f64::INFINITY), MAX_FILTER_BYTES);
        assert_eq!(BitFilter::calculate_m(0.01, f64::NAN), 0);
        // under the cap sizing is untouched
        assert_eq!(BitFilter::calculate_m(0.01, 1e8), 119_813_229);
    }

    #[test]
    fn simple_check() {
        let mut bf = BitFilter::new(3, 0.01);
        bf.insert(&bytes(A));
        assert!(bf.contains(&bytes(A)), "stored value is not found!");
        assert!(!bf.contains(&bytes(B)), "not stored value is found!");

        bf.insert(&bytes(C));
        assert!(bf.contains(&bytes(C)), "stored value is not found!");
        bf.insert(&bytes(D));
        assert!(bf.contains(&bytes(D)), "stored value is not found!");
        assert!(bf.contains(&bytes(A)), "stored value is not found!");
    }

    #[test]
    fn bit_layout_is_stable() {
        let mut bf = BitFilter::new(3, 0.01);
        bf.insert(&bytes(A));
        assert_eq!(bf.as_bytes(), vec![1, 32, 56]);
        bf.insert(&bytes(C));
        bf.insert(&bytes(D));
        assert_eq!(bf.as_bytes(), vec![67, 104, 122]);
        assert_eq!(bf.to_string(), "<BloomFilter:67,104,122 nHashFuncs:5>");
    }

    #[test]
    fn insert_is_idempotent() {
        let mut bf = BitFilter::new(10, 0.01);
        bf.insert(b"repeat");
        let once = bf.as_bytes();
        bf.insert(b"repeat");
        assert_eq!(bf.as_bytes(), once);
    }

    #[test]
    fn clear_resets_bits() {
        let mut bf = BitFilter::new(1, 0.01);
        bf.insert(&bytes(A));
        assert!(bf.contains(&bytes(A)));
        bf.clear();
        assert!(!bf.contains(&bytes(A)));
        assert_eq!(bf.get_size(), 1);
        assert_eq!(bf.hash_funcs(), 5);
        assert_eq!(bf.as_bytes(), vec![0]);
    }

    #[test]
    fn record_round_trip() {
        let empty = BitFilter::new(100, 0.05);
        let restored = BitFilter::from_record(empty.to_record()).unwrap();
        assert_eq!(restored, empty);

        let mut bf = BitFilter::new(100, 0.05);
        for i in 0..100u32 {
            bf.insert(&i.to_be_bytes());
        }
        let restored = BitFilter::from_json(&bf.to_json().unwrap()).unwrap();
        assert_eq!(restored, bf);
        assert_eq!(restored.to_record(), bf.to_record());
        for i in 0..100u32 {
            assert!(restored.contains(&i.to_be_bytes()));
        }
    }

    #[test]
    fn record_needs_data() {
        assert!(matches!(
            BitFilter::from_value(json!({})),
            Err(FilterError::MissingFilterData)
        ));
    }

    #[test]
    fn record_needs_hash_func_count() {
        assert!(matches!(
            BitFilter::from_value(json!({"data": [121, 12, 200]})),
            Err(FilterError::MissingHashFuncCount)
        ));
        assert!(matches!(
            BitFilter::from_value(json!({"data": [121, 12, 200], "hashFuncCount": 0})),
            Err(FilterError::MissingHashFuncCount)
        ));
    }

    #[test]
    fn record_hash_func_count_is_bounded() {
        let err = BitFilter::from_value(json!({"data": [121, 12, 200], "hashFuncCount": 51}))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::HashFuncCountExceedsMax { count: 51, max: 50 }
        ));
        assert!(BitFilter::from_value(json!({"data": [121, 12, 200], "hashFuncCount": 50})).is_ok());
    }

    #[test]
    fn record_must_be_an_object() {
        assert!(matches!(
            BitFilter::from_value(json!("unrecognized")),
            Err(FilterError::UnrecognizedArgument)
        ));
    }

    #[test]
    fn record_loads_foreign_bytes() {
        let bf = BitFilter::from_value(json!({"data": [1, 32, 56], "hashFuncCount": 5})).unwrap();
        assert!(bf.contains(&bytes(A)));
        assert!(!bf.contains(&bytes(B)));
        assert_eq!(bf.level(), None);
    }

    #[test]
    fn verify_false_positive_rate() {
        let mut bf = BitFilter::new(10u32.pow(4), 0.02);
        let mut track_inserted = HashSet::new();

        let mut rng = thread_rng();
        let distribution = Uniform::new_inclusive(0, 10u64.pow(12));
        for _ in 0..10u32.pow(4) {
            let value = rng.sample(distribution).to_be_bytes();
            bf.insert(&value);
            track_inserted.insert(value);
        }

        let mut false_positive = 0;
        for _ in 0..10u32.pow(5) {
            let value = rng.sample(distribution).to_be_bytes();
            if bf.contains(&value) && !track_inserted.contains(&value) {
                false_positive += 1;
            }
        }

        // ~2%, with room for sampling noise
        assert!(false_positive < 3000, "false positives: {}", false_positive);
    }

    proptest! {
        #[test]
        fn no_false_negatives(values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..200)) {
            let mut bf = BitFilter::new(values.len() as u32, 0.01);
            for value in &values {
                bf.insert(value);
                prop_assert!(bf.contains(value));
            }
            for value in &values {
                prop_assert!(bf.contains(value));
            }
        }
    }
}
