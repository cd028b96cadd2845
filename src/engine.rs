// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

// Three algorithms compute the raw edit script between two sequences:
//
// 1. Myers' greedy forward search. The original paper can be found here:
//
// https://link.springer.com/article/10.1007/BF01840446
//
// Only the furthest x reached on every diagonal is kept, along with an arena
// of snakes (runs of equal elements) so the path can be walked back once the
// end of both sequences is reached. It needs O((m + n) * d) time and
// O(m + n) memory besides the snakes.
//
// 2. A dynamic programming LCS over the full m * n matrix. It is only used
// for small inputs, where it buys two things Myers cannot: a bonus for
// extending the diagonal we are already on, which keeps hunks together, and
// a per pair equality score so that e.g. long identical lines anchor the
// alignment more strongly than blank ones.
//
// 3. A greedy anchored walk used once the time budget has run out. It is
// linear-ish and always produces a valid script, just not a minimal one.
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use tracing::{debug, instrument, trace};

use crate::lines_diff::DiffOptions;
use crate::sequence::{HashedSequence, OffsetRange, Sequence, SequenceDiff};
use crate::timeout::Timeout;

/// Inputs whose combined length is below this are diffed with dynamic
/// programming by [`compute_sequence_diff`].
pub(crate) const GENERIC_DP_THRESHOLD: usize = 1700;

/// One change of an edit script, in the shape callers consume.
///
/// The three cases are distinct variants so an empty change cannot be
/// represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceChange {
    Insert {
        original_at: usize,
        modified: OffsetRange,
    },
    Delete {
        original: OffsetRange,
        modified_at: usize,
    },
    Replace {
        original: OffsetRange,
        modified: OffsetRange,
    },
}

impl SequenceChange {
    /// Classifies a pair of aligned ranges; `None` when both are empty.
    pub fn from_ranges(original: OffsetRange, modified: OffsetRange) -> Option<Self> {
        match (original.is_empty(), modified.is_empty()) {
            (true, true) => None,
            (true, false) => Some(Self::Insert {
                original_at: original.start,
                modified,
            }),
            (false, true) => Some(Self::Delete {
                original,
                modified_at: modified.start,
            }),
            (false, false) => Some(Self::Replace { original, modified }),
        }
    }

    pub fn original(&self) -> OffsetRange {
        match *self {
            Self::Insert { original_at, .. } => OffsetRange::empty_at(original_at),
            Self::Delete { original, .. } | Self::Replace { original, .. } => original,
        }
    }

    pub fn modified(&self) -> OffsetRange {
        match *self {
            Self::Delete { modified_at, .. } => OffsetRange::empty_at(modified_at),
            Self::Insert { modified, .. } | Self::Replace { modified, .. } => modified,
        }
    }
}

/// The edit script between two sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    /// Sorted and non-overlapping on both sides.
    pub changes: Vec<SequenceChange>,
    /// The time budget ran out and the script may not be minimal.
    pub hit_timeout: bool,
}

impl Diff {
    pub fn is_identical(&self) -> bool {
        self.changes.is_empty()
    }

    /// Total number of deleted and inserted elements.
    pub fn edit_count(&self) -> usize {
        self.changes
            .iter()
            .map(|c| c.original().len() + c.modified().len())
            .sum()
    }
}

#[derive(Debug, Default)]
pub(crate) struct SequenceDiffResult {
    pub diffs: Vec<SequenceDiff>,
    pub hit_timeout: bool,
}

impl SequenceDiffResult {
    fn new(diffs: Vec<SequenceDiff>) -> Self {
        Self {
            diffs,
            hit_timeout: false,
        }
    }

    /// Everything deleted and everything inserted in one change.
    fn trivial<S: Sequence + ?Sized>(seq1: &S, seq2: &S) -> Self {
        if seq1.is_empty() && seq2.is_empty() {
            return Self::default();
        }
        Self::new(vec![SequenceDiff::new(
            OffsetRange::new(0, seq1.len()),
            OffsetRange::new(0, seq2.len()),
        )])
    }
}

/// Diffs the whole of two slices of hashable items.
///
/// Without a time budget the result is minimal: the number of deleted plus
/// inserted items equals `len1 + len2 - 2 * lcs`.
#[instrument(skip_all)]
pub fn compute_sequence_diff<T: Hash + Eq>(
    original: &[T],
    modified: &[T],
    options: &DiffOptions,
) -> Diff {
    let timeout = Timeout::new(options.max_computation_time_ms);
    let (seq1, seq2) = HashedSequence::pair(original, modified);
    let result = if seq1.len() + seq2.len() < GENERIC_DP_THRESHOLD {
        dynamic_programming_diff(&seq1, &seq2, &timeout, DpScoring::Minimal)
    } else {
        myers_diff(&seq1, &seq2, &timeout)
    };
    debug!(
        changes = result.diffs.len(),
        hit_timeout = result.hit_timeout,
        "sequence diff done"
    );
    Diff {
        changes: result
            .diffs
            .iter()
            .filter_map(|d| SequenceChange::from_ranges(d.seq1, d.seq2))
            .collect(),
        hit_timeout: result.hit_timeout,
    }
}

/// Picks dynamic programming below `dp_threshold` combined elements and
/// Myers above it.
pub(crate) fn diff_sequences<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    timeout: &Timeout,
    dp_threshold: usize,
    scoring: DpScoring<'_>,
) -> SequenceDiffResult {
    if seq1.len() + seq2.len() < dp_threshold {
        dynamic_programming_diff(seq1, seq2, timeout, scoring)
    } else {
        myers_diff(seq1, seq2, timeout)
    }
}

#[derive(Debug)]
struct SnakePath {
    prev: Option<usize>,
    x: usize,
    y: usize,
    length: usize,
}

#[instrument(skip_all)]
pub(crate) fn myers_diff<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    timeout: &Timeout,
) -> SequenceDiffResult {
    if seq1.is_empty() || seq2.is_empty() {
        return SequenceDiffResult::trivial(seq1, seq2);
    }
    let len1 = seq1.len() as isize;
    let len2 = seq2.len() as isize;
    trace!(len1 = len1, len2 = len2);

    let x_after_snake = |mut x: isize, mut y: isize| -> isize {
        while x < len1 && y >= 0 && y < len2 && seq1.element(x as usize) == seq2.element(y as usize)
        {
            x += 1;
            y += 1;
        }
        x
    };

    // Furthest x reached on every diagonal k = x - y, and the last snake on
    // the path that reached it.
    let mut furthest = Diagonals::new(0isize, len1, len2);
    let mut paths: Diagonals<Option<usize>> = Diagonals::new(None, len1, len2);
    let mut snakes: Vec<SnakePath> = Vec::new();

    furthest[0] = x_after_snake(0, 0);
    if furthest[0] != 0 {
        snakes.push(SnakePath {
            prev: None,
            x: 0,
            y: 0,
            length: furthest[0] as usize,
        });
        paths[0] = Some(0);
    }

    let mut d: isize = 0;
    let last_diagonal = 'search: loop {
        d += 1;
        if !timeout.is_valid() {
            debug!(d = d, "myers search timed out, falling back to greedy");
            return greedy_diff(seq1, seq2);
        }
        let lower = -d.min(len2 + d % 2);
        let upper = d.min(len1 + d % 2);
        trace!(d = d, lower = lower, upper = upper, "search space");

        let mut k = lower;
        while k <= upper {
            // Coming from the diagonal above is a deletion, from the one on
            // the left an insertion. Deletions win ties.
            let from_top = if k == upper { -1 } else { furthest[k + 1] };
            let from_left = if k == lower { -1 } else { furthest[k - 1] + 1 };
            let x = from_top.max(from_left).min(len1);
            let y = x - k;
            if x > len1 || y > len2 {
                k += 2;
                continue;
            }
            let new_x = x_after_snake(x, y);
            furthest[k] = new_x;
            let last = if x == from_top {
                paths[k + 1]
            } else {
                paths[k - 1]
            };
            paths[k] = if new_x != x {
                snakes.push(SnakePath {
                    prev: last,
                    x: x as usize,
                    y: y as usize,
                    length: (new_x - x) as usize,
                });
                Some(snakes.len() - 1)
            } else {
                last
            };
            if new_x == len1 && new_x - k == len2 {
                break 'search k;
            }
            k += 2;
        }
    };
    trace!(d = d, snakes = snakes.len(), "reached the end");

    let mut result = Vec::new();
    let mut path = paths[last_diagonal];
    let mut last1 = seq1.len();
    let mut last2 = seq2.len();
    loop {
        let snake = path.map(|index| &snakes[index]);
        let (end1, end2) = snake.map_or((0, 0), |s| (s.x + s.length, s.y + s.length));
        if end1 != last1 || end2 != last2 {
            result.push(SequenceDiff::new(
                OffsetRange::new(end1, last1),
                OffsetRange::new(end2, last2),
            ));
        }
        let Some(snake) = snake else {
            break;
        };
        last1 = snake.x;
        last2 = snake.y;
        path = snake.prev;
    }
    result.reverse();
    SequenceDiffResult::new(result)
}

/// How [`dynamic_programming_diff`] weighs a match.
#[derive(Clone, Copy)]
pub(crate) enum DpScoring<'a> {
    /// Every match counts 1 and nothing else, giving a minimal script.
    Minimal,
    /// Matches that continue a diagonal earn the run length on top, and an
    /// optional score replaces the flat 1 per match.
    PreferRuns(Option<&'a dyn Fn(usize, usize) -> f64>),
}

const FROM_LEFT: u8 = 1;
const FROM_ABOVE: u8 = 2;
const DIAGONAL: u8 = 3;

struct Matrix<T> {
    data: Vec<T>,
    width: usize,
}

impl<T: Copy> Matrix<T> {
    fn new(filler: T, height: usize, width: usize) -> Self {
        Self {
            data: vec![filler; height * width],
            width,
        }
    }

    fn get(&self, row: usize, column: usize) -> T {
        self.data[row * self.width + column]
    }

    fn set(&mut self, row: usize, column: usize, value: T) {
        self.data[row * self.width + column] = value;
    }
}

#[instrument(skip_all)]
pub(crate) fn dynamic_programming_diff<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    timeout: &Timeout,
    scoring: DpScoring<'_>,
) -> SequenceDiffResult {
    if seq1.is_empty() || seq2.is_empty() {
        return SequenceDiffResult::trivial(seq1, seq2);
    }
    let (len1, len2) = (seq1.len(), seq2.len());
    trace!(len1 = len1, len2 = len2);

    let mut scores = Matrix::new(0f64, len1, len2);
    let mut directions = Matrix::new(0u8, len1, len2);
    let mut run_lengths = Matrix::new(0u32, len1, len2);

    for s1 in 0..len1 {
        for s2 in 0..len2 {
            if !timeout.is_valid() {
                debug!(s1 = s1, s2 = s2, "dp diff timed out, falling back to greedy");
                return greedy_diff(seq1, seq2);
            }
            let horizontal = if s1 == 0 { 0.0 } else { scores.get(s1 - 1, s2) };
            let vertical = if s2 == 0 { 0.0 } else { scores.get(s1, s2 - 1) };

            let diagonal = if seq1.element(s1) == seq2.element(s2) {
                let mut score = if s1 == 0 || s2 == 0 {
                    0.0
                } else {
                    scores.get(s1 - 1, s2 - 1)
                };
                match scoring {
                    DpScoring::Minimal => score += 1.0,
                    DpScoring::PreferRuns(equality_score) => {
                        if s1 > 0 && s2 > 0 && directions.get(s1 - 1, s2 - 1) == DIAGONAL {
                            score += f64::from(run_lengths.get(s1 - 1, s2 - 1));
                        }
                        score += equality_score.map_or(1.0, |f| f(s1, s2));
                    }
                }
                score
            } else {
                -1.0
            };

            let best = horizontal.max(vertical).max(diagonal);
            if best == diagonal {
                let previous = if s1 > 0 && s2 > 0 {
                    run_lengths.get(s1 - 1, s2 - 1)
                } else {
                    0
                };
                run_lengths.set(s1, s2, previous + 1);
                directions.set(s1, s2, DIAGONAL);
            } else if best == horizontal {
                directions.set(s1, s2, FROM_LEFT);
            } else {
                directions.set(s1, s2, FROM_ABOVE);
            }
            scores.set(s1, s2, best);
        }
    }

    let mut result = Vec::new();
    let mut last = (len1, len2);
    let (mut s1, mut s2) = (len1, len2);
    loop {
        let aligned = s1 > 0 && s2 > 0 && directions.get(s1 - 1, s2 - 1) == DIAGONAL;
        if aligned || s1 == 0 || s2 == 0 {
            // Off the diagonal at an edge, the rest of both sides is one edit.
            let start = if aligned { (s1, s2) } else { (0, 0) };
            if start != last {
                result.push(SequenceDiff::new(
                    OffsetRange::new(start.0, last.0),
                    OffsetRange::new(start.1, last.1),
                ));
            }
            if !aligned {
                break;
            }
            s1 -= 1;
            s2 -= 1;
            last = (s1, s2);
        } else if directions.get(s1 - 1, s2 - 1) == FROM_LEFT {
            s1 -= 1;
        } else {
            s2 -= 1;
        }
    }
    result.reverse();
    SequenceDiffResult::new(result)
}

/// Best-effort script for when there is no time left for a real search.
///
/// Common prefix and suffix are matched first. In between, every mismatch
/// is resolved by anchoring on the next element of `seq1` that still occurs
/// in `seq2` at or after the current position.
#[instrument(skip_all)]
pub(crate) fn greedy_diff<S: Sequence + ?Sized>(seq1: &S, seq2: &S) -> SequenceDiffResult {
    let (len1, len2) = (seq1.len(), seq2.len());
    let prefix = (0..len1.min(len2))
        .take_while(|&i| seq1.element(i) == seq2.element(i))
        .count();
    let suffix = (0..(len1 - prefix).min(len2 - prefix))
        .take_while(|&i| seq1.element(len1 - 1 - i) == seq2.element(len2 - 1 - i))
        .count();
    let (end1, end2) = (len1 - suffix, len2 - suffix);
    trace!(prefix = prefix, suffix = suffix);

    let mut positions: HashMap<u32, Vec<usize>> = HashMap::new();
    for y in prefix..end2 {
        positions.entry(seq2.element(y)).or_default().push(y);
    }
    let next_occurrence = |element: u32, from: usize| -> Option<usize> {
        let candidates = positions.get(&element)?;
        candidates
            .get(candidates.partition_point(|&p| p < from))
            .copied()
    };

    let mut diffs = Vec::new();
    let (mut x, mut y) = (prefix, prefix);
    while x < end1 && y < end2 {
        if seq1.element(x) == seq2.element(y) {
            x += 1;
            y += 1;
            continue;
        }
        let anchor = (x..end1).find_map(|x2| {
            next_occurrence(seq1.element(x2), y).map(|y2| (x2, y2))
        });
        let Some((x2, y2)) = anchor else {
            break;
        };
        diffs.push(SequenceDiff::new(
            OffsetRange::new(x, x2),
            OffsetRange::new(y, y2),
        ));
        x = x2;
        y = y2;
    }
    if x < end1 || y < end2 {
        diffs.push(SequenceDiff::new(
            OffsetRange::new(x, end1),
            OffsetRange::new(y, end2),
        ));
    }
    SequenceDiffResult {
        diffs,
        hit_timeout: true,
    }
}

/// Per-diagonal storage indexed by the signed diagonal number `k = x - y`.
///
/// Diagonals range from `-right_length` to `left_length`; one more slot on
/// either side holds the out of bounds neighbour read at the extremes.
struct Diagonals<T> {
    data: Vec<T>,
    center: usize,
}

impl<T: Debug> Debug for Diagonals<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.data.iter().enumerate() {
            write!(f, "({}: {v:?})", i as isize - self.center as isize)?;
        }
        Ok(())
    }
}

impl<T: Clone> Diagonals<T> {
    fn new(filler: T, left_length: isize, right_length: isize) -> Self {
        let size = left_length
            .checked_add(right_length)
            .and_then(|s| s.checked_add(3));
        let Some(size) = size else {
            panic!(
                "Tried to create Diagonals of a size we cannot represent: \
                 {left_length} + {right_length} + 3"
            );
        };
        Self {
            data: vec![filler; size as usize],
            center: (right_length + 1) as usize,
        }
    }

    fn actual_index(&self, index: isize) -> usize {
        let actual = self.center as isize + index;
        if actual < 0 || actual as usize >= self.data.len() {
            panic!("Index out of bounds: {index} for Diagonals");
        }
        actual as usize
    }
}

impl<T: Clone> Index<isize> for Diagonals<T> {
    type Output = T;

    fn index(&self, index: isize) -> &Self::Output {
        &self.data[self.actual_index(index)]
    }
}

impl<T: Clone> IndexMut<isize> for Diagonals<T> {
    fn index_mut(&mut self, index: isize) -> &mut Self::Output {
        let actual_index = self.actual_index(index);
        &mut self.data[actual_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn apply<T: Clone>(original: &[T], modified: &[T], diff: &Diff) -> Vec<T> {
        let mut result = Vec::new();
        let mut position = 0;
        for change in &diff.changes {
            let original_range = change.original();
            result.extend_from_slice(&original[position..original_range.start]);
            result.extend_from_slice(&modified[change.modified().as_range()]);
            position = original_range.end_exclusive;
        }
        result.extend_from_slice(&original[position..]);
        result
    }

    fn assert_well_formed(diffs: &[SequenceDiff], len1: usize, len2: usize) {
        for pair in diffs.windows(2) {
            assert!(pair[0].seq1.end_exclusive < pair[1].seq1.start);
            assert!(pair[0].seq2.end_exclusive < pair[1].seq2.start);
        }
        for diff in diffs {
            assert!(!diff.seq1.is_empty() || !diff.seq2.is_empty());
            assert!(diff.seq1.end_exclusive <= len1);
            assert!(diff.seq2.end_exclusive <= len2);
        }
    }

    fn lcs_edit_count(a: &[u8], b: &[u8]) -> usize {
        diff_crate::slice(a, b)
            .iter()
            .filter(|r| !matches!(r, diff_crate::Result::Both(..)))
            .count()
    }

    #[test]
    fn change_from_ranges() {
        assert_eq!(
            SequenceChange::from_ranges(OffsetRange::empty_at(1), OffsetRange::empty_at(1)),
            None
        );
        assert_eq!(
            SequenceChange::from_ranges(OffsetRange::empty_at(2), OffsetRange::new(2, 4)),
            Some(SequenceChange::Insert {
                original_at: 2,
                modified: OffsetRange::new(2, 4)
            })
        );
        let delete =
            SequenceChange::from_ranges(OffsetRange::new(0, 3), OffsetRange::empty_at(0));
        assert_eq!(
            delete,
            Some(SequenceChange::Delete {
                original: OffsetRange::new(0, 3),
                modified_at: 0
            })
        );
        assert_eq!(delete.map(|d| d.modified()), Some(OffsetRange::empty_at(0)));
    }

    #[test]
    fn myers_simple() {
        let a = chars("abcabba");
        let b = chars("cbabac");
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let result = myers_diff(&s1, &s2, &Timeout::unlimited());
        assert!(!result.hit_timeout);
        assert_well_formed(&result.diffs, a.len(), b.len());
        let edits: usize = result
            .diffs
            .iter()
            .map(|d| d.seq1.len() + d.seq2.len())
            .sum();
        assert_eq!(edits, 5);
    }

    #[test]
    fn myers_identical_and_empty() {
        let a = chars("same");
        let (s1, s2) = HashedSequence::pair(&a, &a);
        assert!(myers_diff(&s1, &s2, &Timeout::unlimited()).diffs.is_empty());

        let empty: Vec<char> = vec![];
        let (s1, s2) = HashedSequence::pair(&empty, &a);
        let result = myers_diff(&s1, &s2, &Timeout::unlimited());
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::empty_at(0), OffsetRange::new(0, 4))]
        );
    }

    #[test]
    fn dp_prefers_runs() {
        // With the run bonus the two matched "ab" stay together.
        let a = chars("xabyab");
        let b = chars("ab");
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let result = dynamic_programming_diff(
            &s1,
            &s2,
            &Timeout::unlimited(),
            DpScoring::PreferRuns(None),
        );
        assert_well_formed(&result.diffs, a.len(), b.len());
        let kept: usize = SequenceDiff::invert(&result.diffs, a.len())
            .iter()
            .filter(|d| !d.seq1.is_empty())
            .count();
        assert_eq!(kept, 1);
    }

    #[test]
    fn dp_keeps_leading_edits() {
        let cases: [(&str, &str); 4] = [("ab", "b"), ("b", "ab"), ("x", "y"), ("xab", "yab")];
        for scoring in [DpScoring::Minimal, DpScoring::PreferRuns(None)] {
            for (from, to) in cases {
                let (a, b) = (chars(from), chars(to));
                let (s1, s2) = HashedSequence::pair(&a, &b);
                let result = dynamic_programming_diff(&s1, &s2, &Timeout::unlimited(), scoring);
                assert_well_formed(&result.diffs, a.len(), b.len());
                let diff = Diff {
                    changes: result
                        .diffs
                        .iter()
                        .filter_map(|d| SequenceChange::from_ranges(d.seq1, d.seq2))
                        .collect(),
                    hit_timeout: false,
                };
                assert_eq!(apply(&a, &b, &diff), b, "{from} -> {to}");
            }
        }

        let (a, b) = (["x"], ["y"]);
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let result =
            dynamic_programming_diff(&s1, &s2, &Timeout::unlimited(), DpScoring::Minimal);
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::new(0, 1), OffsetRange::new(0, 1))]
        );
    }

    #[test]
    fn dp_uses_equality_score() {
        let a = ["", "long line", ""];
        let b = ["long line"];
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let score = |s1: usize, _s2: usize| if a[s1].is_empty() { 0.1 } else { 5.0 };
        let result = dynamic_programming_diff(
            &s1,
            &s2,
            &Timeout::unlimited(),
            DpScoring::PreferRuns(Some(&score)),
        );
        assert_eq!(
            result.diffs,
            vec![
                SequenceDiff::new(OffsetRange::new(0, 1), OffsetRange::empty_at(0)),
                SequenceDiff::new(OffsetRange::new(2, 3), OffsetRange::empty_at(1)),
            ]
        );
    }

    #[test]
    fn greedy_is_valid() {
        let a = chars("the quick brown fox");
        let b = chars("the slow brown cat");
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let result = greedy_diff(&s1, &s2);
        assert!(result.hit_timeout);
        assert_well_formed(&result.diffs, a.len(), b.len());
        let diff = Diff {
            changes: result
                .diffs
                .iter()
                .filter_map(|d| SequenceChange::from_ranges(d.seq1, d.seq2))
                .collect(),
            hit_timeout: true,
        };
        assert_eq!(apply(&a, &b, &diff), b);
    }

    #[test]
    fn expired_budget_falls_back_to_greedy() {
        let timeout = Timeout::new(1);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let a = chars("abcdefgh");
        let b = chars("hgfedcba");
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let result = myers_diff(&s1, &s2, &timeout);
        assert!(result.hit_timeout);
        assert_well_formed(&result.diffs, a.len(), b.len());
    }

    #[test]
    fn compute_sequence_diff_is_minimal() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..200 {
            let len1 = rng.gen_range(0..40);
            let len2 = rng.gen_range(0..40);
            let a: Vec<u8> = (0..len1).map(|_| rng.gen_range(b'a'..b'e')).collect();
            let b: Vec<u8> = (0..len2).map(|_| rng.gen_range(b'a'..b'e')).collect();
            let diff = compute_sequence_diff(&a, &b, &DiffOptions::default());
            assert!(!diff.hit_timeout);
            assert_eq!(apply(&a, &b, &diff), b, "round {round}");
            assert_eq!(diff.edit_count(), lcs_edit_count(&a, &b), "round {round}");
        }
    }

    #[test]
    fn large_inputs_use_myers_and_stay_minimal() {
        let mut rng = StdRng::seed_from_u64(42);
        let a: Vec<u8> = (0..1000).map(|_| rng.gen_range(b'a'..b'h')).collect();
        let mut b = a.clone();
        for _ in 0..50 {
            let at = rng.gen_range(0..b.len());
            if rng.gen_bool(0.5) {
                b.remove(at);
            } else {
                b.insert(at, b'z');
            }
        }
        let diff = compute_sequence_diff(&a, &b, &DiffOptions::default());
        assert_eq!(apply(&a, &b, &diff), b);
        assert_eq!(diff.edit_count(), lcs_edit_count(&a, &b));
    }

    #[test]
    fn diagonals_signed_indexing() {
        let mut diagonals = Diagonals::new(0isize, 3, 2);
        diagonals[-3] = 7;
        diagonals[4] = 9;
        assert_eq!(diagonals[-3], 7);
        assert_eq!(diagonals[4], 9);
        assert_eq!(diagonals[0], 0);
    }

    #[test]
    #[should_panic(expected = "Index out of bounds")]
    fn diagonals_out_of_bounds() {
        let diagonals = Diagonals::new(0isize, 3, 2);
        let _ = diagonals[5];
    }
}
