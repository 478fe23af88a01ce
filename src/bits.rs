//! Bit-vector backings for incidence combinations.
//!
//! Every incidence element and covering candidate is a fixed-width bit vector
//! over the hyperedge index domain. Two backings implement the same contract:
//!
//! - [`DenseBits`]: packed `u64` words, word-parallel operations. Fast for
//!   high-density vectors (late rounds, where combinations approach the full
//!   hyperedge set).
//! - [`SparseBits`]: sorted index list. Fast for low-density vectors (early
//!   rounds of large inputs, where the hyperdegree is tiny compared to the
//!   hyperedge count).
//!
//! All binary operations require equal widths. A width mismatch is a caller
//! bug, not bad input, and panics immediately.

use std::fmt;
use std::hash::Hash;

// ============================================================================
// Contract
// ============================================================================

/// Fixed-width bit vector over the hyperedge index domain.
///
/// `Ord` compares vectors by their numeric value (most significant bit first);
/// the greedy solver relies on this for deterministic tie-breaking, so both
/// implementations must order identically for identical bit patterns.
pub trait Bits:
    Clone + fmt::Debug + PartialEq + Eq + PartialOrd + Ord + Hash + Send + Sync + 'static
{
    /// Creates an all-zero vector of the given width.
    fn zeroed(width: usize) -> Self;

    /// Width of the vector in bits.
    fn width(&self) -> usize;

    /// Sets bit `i` to 1.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    fn set_bit(&mut self, i: usize);

    /// Returns bit `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    fn get_bit(&self, i: usize) -> bool;

    /// Number of set bits.
    fn count_ones(&self) -> usize;

    /// Bitwise OR.
    fn union(&self, other: &Self) -> Self;

    /// Bitwise AND.
    fn intersect(&self, other: &Self) -> Self;

    /// Hamming distance (popcount of the XOR).
    fn distance(&self, other: &Self) -> usize;

    /// True iff every set bit of `other` is also set in `self`.
    fn covers(&self, other: &Self) -> bool;

    /// Flips the lowest-index bit that is 0 in `self` and 1 in `other`,
    /// moving `self` one step towards covering `other`.
    ///
    /// Returns `false` without modifying `self` if it already covers `other`.
    fn approach_towards(&mut self, other: &Self) -> bool;
}

// ============================================================================
// DenseBits
// ============================================================================

const WORD_BITS: usize = u64::BITS as usize;

/// Dense backing: packed `u64` words, unused high bits always zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DenseBits {
    width: usize,
    words: Vec<u64>,
}

impl DenseBits {
    #[inline]
    fn check_same_width(&self, other: &Self) {
        assert!(
            self.width == other.width,
            "bit width mismatch: {} vs {}",
            self.width,
            other.width
        );
    }
}

impl Bits for DenseBits {
    fn zeroed(width: usize) -> Self {
        Self {
            width,
            words: vec![0u64; width.div_ceil(WORD_BITS)],
        }
    }

    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn set_bit(&mut self, i: usize) {
        assert!(i < self.width, "bit index {i} out of range ({})", self.width);
        self.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
    }

    #[inline]
    fn get_bit(&self, i: usize) -> bool {
        assert!(i < self.width, "bit index {i} out of range ({})", self.width);
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 != 0
    }

    #[inline]
    fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn union(&self, other: &Self) -> Self {
        self.check_same_width(other);
        Self {
            width: self.width,
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a | b)
                .collect(),
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        self.check_same_width(other);
        Self {
            width: self.width,
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }

    #[inline]
    fn distance(&self, other: &Self) -> usize {
        self.check_same_width(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    #[inline]
    fn covers(&self, other: &Self) -> bool {
        self.check_same_width(other);
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & b == *b)
    }

    fn approach_towards(&mut self, other: &Self) -> bool {
        self.check_same_width(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            let missing = *b & !*a;
            if missing != 0 {
                // Isolate the lowest missing bit.
                *a |= missing & missing.wrapping_neg();
                return true;
            }
        }
        false
    }
}

impl PartialOrd for DenseBits {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DenseBits {
    /// Numeric comparison, most significant word first.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.check_same_width(other);
        self.words.iter().rev().cmp(other.words.iter().rev())
    }
}

// ============================================================================
// SparseBits
// ============================================================================

/// Sparse backing: strictly ascending list of set-bit indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SparseBits {
    width: usize,
    indices: Vec<u32>,
}

impl SparseBits {
    #[inline]
    fn check_same_width(&self, other: &Self) {
        assert!(
            self.width == other.width,
            "bit width mismatch: {} vs {}",
            self.width,
            other.width
        );
    }
}

impl Bits for SparseBits {
    fn zeroed(width: usize) -> Self {
        Self {
            width,
            indices: Vec::new(),
        }
    }

    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    fn set_bit(&mut self, i: usize) {
        assert!(i < self.width, "bit index {i} out of range ({})", self.width);
        let i = i as u32;
        if let Err(pos) = self.indices.binary_search(&i) {
            self.indices.insert(pos, i);
        }
    }

    #[inline]
    fn get_bit(&self, i: usize) -> bool {
        assert!(i < self.width, "bit index {i} out of range ({})", self.width);
        self.indices.binary_search(&(i as u32)).is_ok()
    }

    #[inline]
    fn count_ones(&self) -> usize {
        self.indices.len()
    }

    fn union(&self, other: &Self) -> Self {
        self.check_same_width(other);
        let mut out = Vec::with_capacity(self.indices.len() + other.indices.len());
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => {
                    out.push(self.indices[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(other.indices[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(self.indices[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.indices[i..]);
        out.extend_from_slice(&other.indices[j..]);
        Self {
            width: self.width,
            indices: out,
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        self.check_same_width(other);
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(self.indices[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Self {
            width: self.width,
            indices: out,
        }
    }

    fn distance(&self, other: &Self) -> usize {
        self.check_same_width(other);
        let common = self.intersect(other).indices.len();
        (self.indices.len() - common) + (other.indices.len() - common)
    }

    fn covers(&self, other: &Self) -> bool {
        self.check_same_width(other);
        if self.indices.len() < other.indices.len() {
            return false;
        }
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => return false,
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        j == other.indices.len()
    }

    fn approach_towards(&mut self, other: &Self) -> bool {
        self.check_same_width(other);
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => {
                    // Lowest index set in `other` but not in `self`.
                    let bit = other.indices[j] as usize;
                    self.set_bit(bit);
                    return true;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        if j < other.indices.len() {
            let bit = other.indices[j] as usize;
            self.set_bit(bit);
            return true;
        }
        false
    }
}

impl PartialOrd for SparseBits {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SparseBits {
    /// Numeric comparison: walk both index lists from the highest bit down;
    /// the first position where they diverge decides.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.check_same_width(other);
        let mut a = self.indices.iter().rev();
        let mut b = other.indices.iter().rev();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return std::cmp::Ordering::Equal,
                (None, Some(_)) => return std::cmp::Ordering::Less,
                (Some(_), None) => return std::cmp::Ordering::Greater,
                (Some(x), Some(y)) if x != y => return x.cmp(y),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn from_indices<B: Bits>(width: usize, indices: &[usize]) -> B {
        let mut b = B::zeroed(width);
        for &i in indices {
            b.set_bit(i);
        }
        b
    }

    fn contract_basic_ops<B: Bits>() {
        let a: B = from_indices(10, &[0, 3, 7]);
        let b: B = from_indices(10, &[3, 4, 7]);

        assert_eq!(a.count_ones(), 3);
        assert!(a.get_bit(3));
        assert!(!a.get_bit(4));

        let u = a.union(&b);
        assert_eq!(u.count_ones(), 4);
        assert!(u.get_bit(0) && u.get_bit(3) && u.get_bit(4) && u.get_bit(7));

        let i = a.intersect(&b);
        assert_eq!(i.count_ones(), 2);
        assert!(i.get_bit(3) && i.get_bit(7));

        assert_eq!(a.distance(&b), 2);
        assert!(u.covers(&a));
        assert!(u.covers(&b));
        assert!(!a.covers(&b));
        assert!(a.covers(&a));
    }

    fn contract_approach_towards<B: Bits>() {
        let mut a: B = from_indices(8, &[1, 5]);
        let b: B = from_indices(8, &[2, 5, 6]);

        // Lowest missing bit is 2.
        assert!(a.approach_towards(&b));
        assert!(a.get_bit(2));
        assert_eq!(a.count_ones(), 3);

        // Next missing bit is 6; after that, `a` covers `b` and the
        // operation becomes a flagged no-op.
        assert!(a.approach_towards(&b));
        assert!(a.get_bit(6));
        assert!(a.covers(&b));
        assert!(!a.approach_towards(&b));
        assert_eq!(a.count_ones(), 4);
    }

    fn contract_distance_two_union_popcount<B: Bits>() {
        // For equal-popcount vectors at Hamming distance 2, the union gains
        // exactly one bit over either operand.
        let a: B = from_indices(12, &[0, 4, 9]);
        let b: B = from_indices(12, &[0, 4, 11]);
        assert_eq!(a.distance(&b), 2);
        assert_eq!(a.union(&b).count_ones(), a.count_ones() + 1);
    }

    #[test]
    fn dense_contract() {
        contract_basic_ops::<DenseBits>();
        contract_approach_towards::<DenseBits>();
        contract_distance_two_union_popcount::<DenseBits>();
    }

    #[test]
    fn sparse_contract() {
        contract_basic_ops::<SparseBits>();
        contract_approach_towards::<SparseBits>();
        contract_distance_two_union_popcount::<SparseBits>();
    }

    #[test]
    fn multi_word_dense() {
        let mut a = DenseBits::zeroed(200);
        a.set_bit(0);
        a.set_bit(63);
        a.set_bit(64);
        a.set_bit(199);
        assert_eq!(a.count_ones(), 4);
        assert!(a.get_bit(63) && a.get_bit(64) && a.get_bit(199));
        assert!(!a.get_bit(128));

        let b = DenseBits::zeroed(200);
        assert_eq!(a.distance(&b), 4);
        assert!(a.covers(&b));
        assert!(!b.covers(&a));
    }

    #[test]
    fn set_bit_is_idempotent() {
        let mut d = DenseBits::zeroed(16);
        let mut s = SparseBits::zeroed(16);
        for _ in 0..3 {
            d.set_bit(5);
            s.set_bit(5);
        }
        assert_eq!(d.count_ones(), 1);
        assert_eq!(s.count_ones(), 1);
    }

    #[test]
    #[should_panic(expected = "bit width mismatch")]
    fn dense_width_mismatch_panics() {
        let a = DenseBits::zeroed(10);
        let b = DenseBits::zeroed(11);
        let _ = a.distance(&b);
    }

    #[test]
    #[should_panic(expected = "bit width mismatch")]
    fn sparse_width_mismatch_panics() {
        let a = SparseBits::zeroed(10);
        let b = SparseBits::zeroed(11);
        let _ = a.union(&b);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_bit_panics() {
        let mut a = SparseBits::zeroed(4);
        a.set_bit(4);
    }

    /// Randomized cross-check: both backings must agree on every operation
    /// and on the numeric ordering for identical bit patterns.
    #[test]
    fn dense_and_sparse_agree() {
        let mut rng = XorShiftRng::seed_from_u64(0x9E3779B9);
        const WIDTH: usize = 130;

        for _ in 0..500 {
            let bits_a: Vec<usize> = (0..WIDTH).filter(|_| rng.random_bool(0.3)).collect();
            let bits_b: Vec<usize> = (0..WIDTH).filter(|_| rng.random_bool(0.3)).collect();

            let da: DenseBits = from_indices(WIDTH, &bits_a);
            let db: DenseBits = from_indices(WIDTH, &bits_b);
            let sa: SparseBits = from_indices(WIDTH, &bits_a);
            let sb: SparseBits = from_indices(WIDTH, &bits_b);

            assert_eq!(da.count_ones(), sa.count_ones());
            assert_eq!(da.distance(&db), sa.distance(&sb));
            assert_eq!(da.covers(&db), sa.covers(&sb));
            assert_eq!(da.union(&db).count_ones(), sa.union(&sb).count_ones());
            assert_eq!(
                da.intersect(&db).count_ones(),
                sa.intersect(&sb).count_ones()
            );
            assert_eq!(da.cmp(&db), sa.cmp(&sb), "ordering diverged");

            let mut da2 = da.clone();
            let mut sa2 = sa.clone();
            assert_eq!(da2.approach_towards(&db), sa2.approach_towards(&sb));
            for i in 0..WIDTH {
                assert_eq!(da2.get_bit(i), sa2.get_bit(i), "bit {i} diverged");
            }
        }
    }

    #[test]
    fn ordering_is_numeric() {
        // 0b1000 > 0b0111
        let hi: DenseBits = from_indices(70, &[3]);
        let lo: DenseBits = from_indices(70, &[0, 1, 2]);
        assert!(hi > lo);

        // A bit in the second word outweighs anything in the first.
        let second_word: DenseBits = from_indices(70, &[65]);
        let first_word: DenseBits = from_indices(70, &[0, 1, 2, 3, 60, 63]);
        assert!(second_word > first_word);

        let s_hi: SparseBits = from_indices(70, &[65]);
        let s_lo: SparseBits = from_indices(70, &[0, 1, 2, 3, 60, 63]);
        assert!(s_hi > s_lo);
    }
}
