//! Finite sets of serialized lengths, in bits.
//!
//! A [`BitLengthSet`] holds every length a serialized value of some type can take.
//! Sets are combined with two operators:
//!
//! | Operation | Meaning | Operator |
//! |-----------|---------|----------|
//! | union | "either this or that" (union variants) | `a | b`, `a |= b` |
//! | pointwise sum | "this, then that" (struct fields) | `a + b`, `a += b` |
//! | scalar shift | fixed-width prefix (tag, delimiter header) | `a + n`, `a += n` |
//!
//! The set is stored explicitly in ascending order, so equality is plain set equality
//! regardless of how the set was built.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, AddAssign, BitOr, BitOrAssign, Range, RangeInclusive};

/// Set of possible bit lengths. May be empty only before it is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitLengthSet {
    values: BTreeSet<u64>,
}

impl BitLengthSet {
    /// Empty set. Union with it is the identity; pointwise sum with it is empty.
    pub fn new() -> Self {
        BitLengthSet::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.values.contains(&value)
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().copied()
    }

    pub fn min(&self) -> Option<u64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<u64> {
        self.values.last().copied()
    }

    /// True if every element is a multiple of `alignment`. Vacuously true for an empty set.
    pub fn is_aligned_at(&self, alignment: u64) -> bool {
        if alignment <= 1 {
            return true;
        }
        self.values.iter().all(|x| x % alignment == 0)
    }

    pub fn is_aligned_at_byte(&self) -> bool {
        self.is_aligned_at(crate::types::BITS_PER_BYTE)
    }

    /// Rounds every element up to the next multiple of `alignment`.
    /// Aligned elements are left as they are; duplicates produced by rounding collapse.
    /// Overflow behaves as for `u64` arithmetic; see [`BitLengthSet::checked_padded_to`].
    pub fn pad_to_alignment(&mut self, alignment: u64) {
        if alignment <= 1 || self.is_aligned_at(alignment) {
            return;
        }
        self.values = self
            .values
            .iter()
            .map(|x| x.next_multiple_of(alignment))
            .collect();
    }

    /// Consuming form of [`BitLengthSet::pad_to_alignment`].
    pub fn padded_to(mut self, alignment: u64) -> Self {
        self.pad_to_alignment(alignment);
        self
    }

    /// Like [`BitLengthSet::padded_to`]; `None` if an element overflows.
    pub fn checked_padded_to(self, alignment: u64) -> Option<Self> {
        if alignment <= 1 || self.is_aligned_at(alignment) {
            return Some(self);
        }
        let values = self
            .values
            .iter()
            .map(|x| x.checked_next_multiple_of(alignment))
            .collect::<Option<_>>()?;
        Some(BitLengthSet { values })
    }

    /// Pointwise sum; `None` if an element overflows.
    pub fn checked_add(&self, other: &BitLengthSet) -> Option<BitLengthSet> {
        let mut values = BTreeSet::new();
        for a in &self.values {
            for b in &other.values {
                values.insert(a.checked_add(*b)?);
            }
        }
        Some(BitLengthSet { values })
    }

    /// Scalar shift; `None` if an element overflows.
    pub fn checked_shift(&self, offset: u64) -> Option<BitLengthSet> {
        let values = self
            .values
            .iter()
            .map(|x| x.checked_add(offset))
            .collect::<Option<_>>()?;
        Some(BitLengthSet { values })
    }

    /// Pointwise sum of `count` copies of this set, i.e. the lengths of `count` consecutive
    /// elements of this type. `repeat(0)` is `{0}`.
    ///
    /// `None` if a length overflows `u64` or the result is too large to enumerate
    /// (see [`MAX_LEN`]).
    pub fn repeat(&self, count: u64) -> Option<Self> {
        if count == 0 {
            return Some(BitLengthSet::from(0));
        }
        let Some(min) = self.min() else {
            return Some(BitLengthSet::new());
        };
        // n elements of S are n * min plus at most n picks from S - min.
        let steps: Vec<u64> = self.values.iter().filter(|&&x| x > min).map(|x| x - min).collect();
        sums_of_at_most(&steps, count)?.checked_shift(min.checked_mul(count)?)
    }

    /// Union of `repeat(k)` for every `k` in `0..=max_count`: the lengths of a run of
    /// between zero and `max_count` elements. Fails like [`BitLengthSet::repeat`].
    pub fn repeat_range(&self, max_count: u64) -> Option<Self> {
        let steps: Vec<u64> = self.values.iter().copied().filter(|&x| x > 0).collect();
        sums_of_at_most(&steps, max_count)
    }

    fn pointwise_sum(&self, other: &BitLengthSet) -> BitLengthSet {
        let mut values = BTreeSet::new();
        for a in &self.values {
            for b in &other.values {
                values.insert(a + b);
            }
        }
        BitLengthSet { values }
    }

    fn shifted(&self, offset: u64) -> BitLengthSet {
        BitLengthSet {
            values: self.values.iter().map(|x| x + offset).collect(),
        }
    }
}

/// Most distinct lengths a repetition or a delimited type may enumerate.
pub const MAX_LEN: usize = 1 << 20;

/// Upper bound on the inner loop of [`sums_of_at_most`].
const MAX_REPETITION_WORK: usize = 1 << 28;

/// Every sum of at most `count` elements of `steps` (positive, ascending), repetition allowed.
///
/// All sums lie on the grid of the steps' greatest common divisor, so this is a shortest-path
/// count over grid cells: a cell is reachable if it takes no more than `count` steps.
fn sums_of_at_most(steps: &[u64], count: u64) -> Option<BitLengthSet> {
    let Some(&largest) = steps.last() else {
        return Some(BitLengthSet::from(0));
    };
    if count == 0 {
        return Some(BitLengthSet::from(0));
    }
    let grid = steps.iter().fold(0, |g, &s| gcd(g, s));
    let top = largest.checked_mul(count)?;
    let cells = usize::try_from(top / grid).ok()?.checked_add(1)?;
    if cells > MAX_LEN || cells.checked_mul(steps.len())? > MAX_REPETITION_WORK {
        return None;
    }
    let strides = steps
        .iter()
        .map(|&s| usize::try_from(s / grid).ok())
        .collect::<Option<Vec<usize>>>()?;

    let mut fewest = vec![u64::MAX; cells];
    fewest[0] = 0;
    for i in 1..cells {
        for &stride in &strides {
            if stride > i {
                break;
            }
            let previous = fewest[i - stride];
            if previous < fewest[i].saturating_sub(1) {
                fewest[i] = previous + 1;
            }
        }
    }
    Some(
        fewest
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n <= count)
            .map(|(i, _)| i as u64 * grid)
            .collect(),
    )
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl From<u64> for BitLengthSet {
    fn from(value: u64) -> Self {
        BitLengthSet {
            values: BTreeSet::from([value]),
        }
    }
}

impl<const N: usize> From<[u64; N]> for BitLengthSet {
    fn from(values: [u64; N]) -> Self {
        values.into_iter().collect()
    }
}

impl From<Range<u64>> for BitLengthSet {
    fn from(range: Range<u64>) -> Self {
        range.collect()
    }
}

impl From<RangeInclusive<u64>> for BitLengthSet {
    fn from(range: RangeInclusive<u64>) -> Self {
        range.collect()
    }
}

impl FromIterator<u64> for BitLengthSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        BitLengthSet {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BitLengthSet {
    type Item = u64;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter().copied()
    }
}

impl BitOr<&BitLengthSet> for &BitLengthSet {
    type Output = BitLengthSet;

    fn bitor(self, rhs: &BitLengthSet) -> BitLengthSet {
        BitLengthSet {
            values: self.values.union(&rhs.values).copied().collect(),
        }
    }
}

impl BitOrAssign<&BitLengthSet> for BitLengthSet {
    fn bitor_assign(&mut self, rhs: &BitLengthSet) {
        self.values.extend(rhs.values.iter().copied());
    }
}

impl Add<&BitLengthSet> for &BitLengthSet {
    type Output = BitLengthSet;

    fn add(self, rhs: &BitLengthSet) -> BitLengthSet {
        self.pointwise_sum(rhs)
    }
}

impl AddAssign<&BitLengthSet> for BitLengthSet {
    fn add_assign(&mut self, rhs: &BitLengthSet) {
        *self = self.pointwise_sum(rhs);
    }
}

impl Add<u64> for &BitLengthSet {
    type Output = BitLengthSet;

    fn add(self, rhs: u64) -> BitLengthSet {
        self.shifted(rhs)
    }
}

impl Add<u64> for BitLengthSet {
    type Output = BitLengthSet;

    fn add(self, rhs: u64) -> BitLengthSet {
        self.shifted(rhs)
    }
}

impl AddAssign<u64> for BitLengthSet {
    fn add_assign(&mut self, rhs: u64) {
        if rhs != 0 {
            *self = self.shifted(rhs);
        }
    }
}

impl fmt::Display for BitLengthSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, x) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        assert_eq!(BitLengthSet::from(8).len(), 1);
        assert_eq!(BitLengthSet::from(0..4), BitLengthSet::from([0, 1, 2, 3]));
        assert_eq!(BitLengthSet::from(0..=4), BitLengthSet::from([4, 3, 2, 1, 0]));
        assert!(BitLengthSet::new().is_empty());
        assert_eq!(BitLengthSet::from([3, 1, 3]).len(), 2);
    }

    #[test]
    fn union_is_set_union() {
        let a = BitLengthSet::from([1, 2]);
        let b = BitLengthSet::from([2, 5]);
        assert_eq!(&a | &b, BitLengthSet::from([1, 2, 5]));
        let mut c = BitLengthSet::new();
        c |= &a;
        assert_eq!(c, a);
    }

    #[test]
    fn pointwise_sum_covers_every_pair() {
        let a = BitLengthSet::from([0, 8]);
        let b = BitLengthSet::from([16, 24]);
        assert_eq!(&a + &b, BitLengthSet::from([16, 24, 32]));
        let mut c = BitLengthSet::from(0);
        c += &a;
        c += &b;
        assert_eq!(c, BitLengthSet::from([16, 24, 32]));
        assert!((&a + &BitLengthSet::new()).is_empty());
    }

    #[test]
    fn scalar_shift() {
        let a = BitLengthSet::from([1, 9]);
        assert_eq!(&a + 7, BitLengthSet::from([8, 16]));
        let mut b = a.clone();
        b += 0;
        assert_eq!(a, b);
    }

    #[test]
    fn padding_and_alignment() {
        let mut a = BitLengthSet::from([0, 1, 7, 8, 9]);
        assert!(!a.is_aligned_at_byte());
        a.pad_to_alignment(8);
        assert_eq!(a, BitLengthSet::from([0, 8, 16]));
        assert!(a.is_aligned_at_byte());
        assert!(!a.is_aligned_at(16));
        assert!(a.is_aligned_at(1));
        assert_eq!(a.clone().padded_to(32), BitLengthSet::from([0, 32]));
        assert_eq!(BitLengthSet::from(3).padded_to(1), BitLengthSet::from(3));
    }

    #[test]
    fn repetition() {
        let small = BitLengthSet::from([8, 16, 24]);
        assert_eq!(small.repeat(0), Some(BitLengthSet::from(0)));
        assert_eq!(small.repeat(1), Some(small.clone()));
        assert_eq!(small.repeat(2), Some(BitLengthSet::from([16, 24, 32, 40, 48])));
        assert_eq!(BitLengthSet::from(8).repeat(1000), Some(BitLengthSet::from(8000)));
        assert_eq!(BitLengthSet::new().repeat(3), Some(BitLengthSet::new()));
        assert_eq!(BitLengthSet::from(8).repeat_range(2), Some(BitLengthSet::from([0, 8, 16])));
        assert_eq!(BitLengthSet::from(8).repeat_range(0), Some(BitLengthSet::from(0)));
        assert_eq!(BitLengthSet::from([0, 5]).repeat_range(2), Some(BitLengthSet::from([0, 5, 10])));
    }

    #[test]
    fn repetition_matches_repeated_sums() {
        let element = BitLengthSet::from([8, 24, 40]);
        let mut run = BitLengthSet::from(0);
        let mut any = BitLengthSet::from(0);
        for k in 1..=5 {
            run += &element;
            any |= &run;
            assert_eq!(element.repeat(k), Some(run.clone()), "repeat({})", k);
            assert_eq!(element.repeat_range(k), Some(any.clone()), "repeat_range({})", k);
        }
    }

    #[test]
    fn oversized_repetition_is_refused() {
        // 2^60 * 64 does not fit in 64 bits.
        assert_eq!(BitLengthSet::from(64).repeat(1 << 60), None);
        assert_eq!(BitLengthSet::from(64).repeat(1 << 57), Some(BitLengthSet::from(1 << 63)));
        // Too many distinct lengths to enumerate.
        assert_eq!(BitLengthSet::from(8).repeat_range(1 << 40), None);
        assert_eq!(BitLengthSet::from([8, 16]).repeat(1 << 40), None);
        assert!(BitLengthSet::from(8).repeat_range(1000).is_some());
    }

    #[test]
    fn checked_arithmetic() {
        let top = BitLengthSet::from([8, u64::MAX - 1]);
        assert_eq!(top.checked_shift(1), Some(BitLengthSet::from([9, u64::MAX])));
        assert_eq!(top.checked_shift(2), None);
        assert_eq!(top.checked_add(&BitLengthSet::from(2)), None);
        assert_eq!(top.clone().checked_padded_to(8), None);
        assert_eq!(
            BitLengthSet::from([1, 9]).checked_padded_to(8),
            Some(BitLengthSet::from([8, 16]))
        );
        assert_eq!(
            BitLengthSet::from([0, 8]).checked_add(&BitLengthSet::from([1, 2])),
            Some(BitLengthSet::from([1, 2, 9, 10]))
        );
    }

    #[test]
    fn min_max_and_display() {
        let a = BitLengthSet::from([24, 8, 16]);
        assert_eq!(a.min(), Some(8));
        assert_eq!(a.max(), Some(24));
        assert_eq!(a.to_string(), "{8, 16, 24}");
        assert_eq!(BitLengthSet::new().max(), None);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![8, 16, 24]);
    }
}
