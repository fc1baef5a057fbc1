//! Multi-level filter cascade.
//!
//! Level 0 holds the target set R. Level 1 holds the members of the candidate
//! set S that level 0 lets through. From there the builder alternates between
//! the two sides, each new level holding the members of one side that passed
//! the level before it, until a side runs dry.
//!
//! A query walks the levels in order, flipping its answer on every level that
//! matches and stopping at the first level that does not.

use std::collections::HashSet;
use std::f64::consts::LN_2;
use std::fmt;

use tracing::{debug, warn};

use crate::bloom_filters::{BitFilter, Filter};
use crate::config::CascadeConfig;
use crate::error::CascadeError;
use crate::record::CascadeRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Target,
    Candidate,
}

impl Side {
    fn flip(self) -> Self {
        match self {
            Side::Target => Side::Candidate,
            Side::Candidate => Side::Target,
        }
    }
}

/// Ordered chain of [`BitFilter`] levels separating a target set from the
/// rest of a candidate superset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCascade {
    levels: Vec<BitFilter>,
}

impl FilterCascade {
    /// Build a cascade recognising every member of `r` and rejecting the
    /// members of `s` that are not in `r`.
    ///
    /// `r_capacity` and `s_capacity` only drive level sizing; `fp_rate` is the
    /// base false positive rate of every level.
    pub fn build<T: AsRef<[u8]>>(
        r: &[T],
        s: &[T],
        r_capacity: usize,
        s_capacity: usize,
        fp_rate: f64,
    ) -> Result<Self, CascadeError> {
        let config = CascadeConfig::default().with_fp_rate(fp_rate);
        Self::build_with_config(r, s, r_capacity, s_capacity, &config)
    }

    pub fn build_with_config<T: AsRef<[u8]>>(
        r: &[T],
        s: &[T],
        r_capacity: usize,
        s_capacity: usize,
        config: &CascadeConfig,
    ) -> Result<Self, CascadeError> {
        config.validate()?;
        let p = config.fp_rate;

        let mut seen = HashSet::new();
        let mut targets: Vec<&[u8]> = r
            .iter()
            .map(|x| x.as_ref())
            .filter(|x| seen.insert(*x))
            .collect();
        // S includes R; only its non-members need to be excluded, once each
        let mut candidates: Vec<&[u8]> = s
            .iter()
            .map(|x| x.as_ref())
            .filter(|x| seen.insert(*x))
            .collect();

        let mut target_sizes = Vec::new();
        let mut candidate_sizes = Vec::new();
        let mut levels = Vec::new();

        let top = level_filter(r_capacity as f64, &targets, p, &mut target_sizes);
        push_level(&mut levels, top, Side::Target, targets.len());

        candidates.retain(|x| levels[0].contains(x));
        let capacity = (s_capacity as f64 * p).ceil();
        let fp_filter = level_filter(capacity, &candidates, p, &mut candidate_sizes);
        push_level(&mut levels, fp_filter, Side::Candidate, candidates.len());

        let mut rate_modifier = p;
        let mut side = Side::Target;
        loop {
            let (capacity, members, sizes) = match side {
                Side::Target => (
                    r_capacity as f64 * rate_modifier,
                    &mut targets,
                    &mut target_sizes,
                ),
                Side::Candidate => {
                    rate_modifier *= p;
                    (
                        s_capacity as f64 * rate_modifier,
                        &mut candidates,
                        &mut candidate_sizes,
                    )
                }
            };

            let last = &levels[levels.len() - 1];
            let survivors: Vec<&[u8]> = members
                .iter()
                .copied()
                .filter(|x| last.contains(x))
                .collect();

            // A lone surviving target still needs its own level, otherwise it
            // would read as a non-member. A lone candidate is left as a false
            // positive.
            let done = match side {
                Side::Target => survivors.is_empty(),
                Side::Candidate => survivors.len() <= 1,
            };
            if done {
                debug!(
                    levels = levels.len(),
                    bytes = levels.iter().map(Filter::get_size).sum::<usize>(),
                    "cascade built"
                );
                break;
            }

            if levels.len() >= config.max_levels {
                warn!(
                    limit = config.max_levels,
                    remaining = survivors.len(),
                    "cascade did not converge"
                );
                return Err(CascadeError::LevelLimitExceeded {
                    limit: config.max_levels,
                });
            }

            let filter = level_filter(capacity, &survivors, p, sizes);
            push_level(&mut levels, filter, side, survivors.len());
            *members = survivors;
            side = side.flip();
        }

        Ok(Self { levels })
    }

    /// Parity of the run of matching levels starting at level 0.
    pub fn contains(&self, value: &[u8]) -> bool {
        let mut included = false;
        for level in &self.levels {
            if level.contains(value) {
                included = !included;
            } else {
                break;
            }
        }
        included
    }

    pub fn levels(&self) -> &[BitFilter] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Combined size of all levels in bytes.
    pub fn total_bytes(&self) -> usize {
        self.levels.iter().map(Filter::get_size).sum()
    }

    pub fn to_record(&self) -> CascadeRecord {
        CascadeRecord {
            filters: self.levels.iter().map(BitFilter::to_record).collect(),
        }
    }

    pub fn from_record(record: CascadeRecord) -> Result<Self, CascadeError> {
        let levels = record
            .filters
            .into_iter()
            .map(BitFilter::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { levels })
    }

    pub fn to_json(&self) -> Result<String, CascadeError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self, CascadeError> {
        let record: CascadeRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }
}

/// Level holding `members`, sized for `capacity` elements at rate `p`.
///
/// A level that holds members is sized for at least as many elements as it
/// holds and at least one byte. Every level hashes with the same seeds, so on
/// each side a byte length that divides an earlier one on that side would
/// repeat the earlier level's collisions; such lengths are skipped.
/// `sizes` collects the byte lengths used so far on the level's side.
fn level_filter(capacity: f64, members: &[&[u8]], p: f64, sizes: &mut Vec<usize>) -> BitFilter {
    if members.is_empty() {
        return BitFilter::with_capacity(capacity, p);
    }

    // smallest capacity that sizes to a whole byte at rate p
    let one_byte = 9.0 * LN_2.powi(2) / -p.ln();
    let capacity = capacity.max(members.len() as f64).max(one_byte);
    let mut byte_len = BitFilter::calculate_m(p, capacity).max(1);
    while sizes.iter().any(|&used| used % byte_len == 0) {
        byte_len += 1;
    }
    sizes.push(byte_len);

    let mut filter = BitFilter::with_byte_len(byte_len, capacity, p);
    for x in members {
        filter.insert(x);
    }
    filter
}

fn push_level(levels: &mut Vec<BitFilter>, mut filter: BitFilter, side: Side, members: usize) {
    let index = levels.len();
    filter.set_level(index as u32);
    debug!(
        index,
        side = ?side,
        members,
        bytes = filter.get_size(),
        hash_funcs = filter.hash_funcs(),
        "cascade level added"
    );
    levels.push(filter);
}

impl fmt::Display for FilterCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<FilterCascade levels:{}>", self.levels.len())
    }
}
