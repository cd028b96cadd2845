// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! Post-processing of raw edit scripts.
//!
//! A minimal script is not necessarily the one a human would write: an
//! inserted function can be reported as starting in the middle of the
//! previous one, and a rewritten sentence as dozens of one-letter edits.
//! These passes move and join changes so that hunks line up with what a
//! reader perceives, without ever making the script invalid.

use std::collections::VecDeque;

use tracing::trace;

use crate::sequence::{
    CharSliceSequence, LineSequence, OffsetPair, OffsetRange, Sequence, SequenceDiff,
};

/// Insertions and deletions are never shifted further than this.
const MAX_SHIFT: usize = 100;

/// Rounds of joining before giving up on reaching a fixed point.
const MAX_JOIN_ROUNDS: usize = 10;

/// Joins what can be joined by shifting, then moves every pure insertion
/// or deletion to its best scored position.
pub(crate) fn optimize_sequence_diffs<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let diffs = join_sequence_diffs_by_shifting(seq1, seq2, diffs);
    // A second round sometimes finds joins the first one enabled.
    let diffs = join_sequence_diffs_by_shifting(seq1, seq2, diffs);
    shift_sequence_diffs(seq1, seq2, diffs)
}

fn join_sequence_diffs_by_shifting<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut diffs = diffs.into_iter();
    let Some(first) = diffs.next() else {
        return Vec::new();
    };

    // Shift everything left as far as possible, joining with the previous
    // change when the gap closes.
    let mut left: Vec<SequenceDiff> = vec![first];
    for mut current in diffs {
        let Some(previous) = left.last_mut() else {
            continue;
        };
        if current.seq1.is_empty() || current.seq2.is_empty() {
            let gap = current.seq1.start - previous.seq1.end_exclusive;
            let shift = (1..=gap)
                .take_while(|&d| {
                    seq1.element(current.seq1.start - d)
                        == seq1.element(current.seq1.end_exclusive - d)
                        && seq2.element(current.seq2.start - d)
                            == seq2.element(current.seq2.end_exclusive - d)
                })
                .count();
            if shift == gap {
                *previous = SequenceDiff::new(
                    OffsetRange::new(previous.seq1.start, current.seq1.end_exclusive - gap),
                    OffsetRange::new(previous.seq2.start, current.seq2.end_exclusive - gap),
                );
                continue;
            }
            current = current.delta(-(shift as isize));
        }
        left.push(current);
    }

    // Then shift right, joining with the next change.
    let mut result = Vec::with_capacity(left.len());
    for i in 0..left.len() {
        let mut current = left[i];
        if let Some(&next) = left.get(i + 1) {
            if current.seq1.is_empty() || current.seq2.is_empty() {
                let gap = next.seq1.start - current.seq1.end_exclusive;
                let shift = (0..gap)
                    .take_while(|&d| {
                        seq1.is_strongly_equal(
                            current.seq1.start + d,
                            current.seq1.end_exclusive + d,
                        )
                            && seq2.is_strongly_equal(
                                current.seq2.start + d,
                                current.seq2.end_exclusive + d,
                            )
                    })
                    .count();
                if shift == gap {
                    left[i + 1] = SequenceDiff::new(
                        OffsetRange::new(current.seq1.start + gap, next.seq1.end_exclusive),
                        OffsetRange::new(current.seq2.start + gap, next.seq2.end_exclusive),
                    );
                    continue;
                }
                current = current.delta(shift as isize);
            }
        }
        result.push(current);
    }
    result
}

fn shift_sequence_diffs<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if seq1.boundary_score(0).is_none() || seq2.boundary_score(0).is_none() {
        return diffs;
    }
    for i in 0..diffs.len() {
        let previous = i.checked_sub(1).map(|p| diffs[p]);
        let next = diffs.get(i + 1).copied();
        // Stay one element clear of the neighbours.
        let valid1 = (
            previous.map_or(0, |p| p.seq1.end_exclusive + 1),
            next.map_or(seq1.len(), |n| n.seq1.start.saturating_sub(1)),
        );
        let valid2 = (
            previous.map_or(0, |p| p.seq2.end_exclusive + 1),
            next.map_or(seq2.len(), |n| n.seq2.start.saturating_sub(1)),
        );
        let diff = diffs[i];
        if diff.seq1.is_empty() {
            diffs[i] = shift_diff_to_better_position(diff, seq1, seq2, valid1, valid2);
        } else if diff.seq2.is_empty() {
            diffs[i] =
                shift_diff_to_better_position(diff.swap(), seq2, seq1, valid2, valid1).swap();
        }
    }
    diffs
}

/// Moves an insertion (empty on the `seq1` side) to the equivalent
/// position whose surrounding boundaries score best.
fn shift_diff_to_better_position<S: Sequence + ?Sized>(
    diff: SequenceDiff,
    seq1: &S,
    seq2: &S,
    valid1: (usize, usize),
    valid2: (usize, usize),
) -> SequenceDiff {
    let mut before = 1;
    while diff.seq1.start >= valid1.0 + before
        && diff.seq2.start >= valid2.0 + before
        && seq2.is_strongly_equal(diff.seq2.start - before, diff.seq2.end_exclusive - before)
        && before < MAX_SHIFT
    {
        before += 1;
    }
    before -= 1;

    let mut after = 0;
    while diff.seq1.start + after < valid1.1
        && diff.seq2.end_exclusive + after < valid2.1
        && seq2.is_strongly_equal(diff.seq2.start + after, diff.seq2.end_exclusive + after)
        && after < MAX_SHIFT
    {
        after += 1;
    }

    if before == 0 && after == 0 {
        return diff;
    }

    let score1 = |offset: usize| seq1.boundary_score(offset).unwrap_or(0);
    let score2 = |offset: usize| seq2.boundary_score(offset).unwrap_or(0);
    let mut best_delta = 0isize;
    let mut best_score = -1;
    for delta in -(before as isize)..=(after as isize) {
        let start2 = diff.seq2.start.saturating_add_signed(delta);
        let end2 = diff.seq2.end_exclusive.saturating_add_signed(delta);
        let offset1 = diff.seq1.start.saturating_add_signed(delta);
        let score = score1(offset1) + score2(start2) + score2(end2);
        if score > best_score {
            best_score = score;
            best_delta = delta;
        }
    }
    trace!(before = before, after = after, best_delta = best_delta, "shifted change");
    diff.delta(best_delta)
}

/// Joins changes separated by at most two equal elements.
pub(crate) fn remove_short_matches(diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    for diff in diffs {
        match result.last_mut() {
            Some(last)
                if diff.seq1.start - last.seq1.end_exclusive <= 2
                    || diff.seq2.start - last.seq2.end_exclusive <= 2 =>
            {
                *last = last.join(&diff);
            }
            _ => result.push(diff),
        }
    }
    result
}

/// Repeatedly joins neighbouring changes while `should_join` agrees, up to
/// [`MAX_JOIN_ROUNDS`] rounds.
fn join_until_stable(
    mut diffs: Vec<SequenceDiff>,
    should_join: impl Fn(&SequenceDiff, &SequenceDiff) -> bool,
) -> Vec<SequenceDiff> {
    for round in 0..=MAX_JOIN_ROUNDS {
        let mut joined = false;
        let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
        for diff in diffs {
            match result.last_mut() {
                Some(last) if should_join(last, &diff) => {
                    *last = last.join(&diff);
                    joined = true;
                }
                _ => result.push(diff),
            }
        }
        diffs = result;
        if !joined {
            trace!(round = round, "joining reached a fixed point");
            break;
        }
    }
    diffs
}

/// Merges line changes separated only by lines like `}` or blank lines,
/// when one of them is large enough for the gap to be noise.
pub(crate) fn remove_very_short_matching_lines_between_diffs(
    seq1: &LineSequence<'_>,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    join_until_stable(diffs, |before, after| {
        let unchanged = OffsetRange::new(before.seq1.end_exclusive, after.seq1.start);
        let significant = seq1
            .text(unchanged)
            .chars()
            .filter(|c| !c.is_whitespace())
            .count();
        significant <= 4
            && (before.seq1.len() + before.seq2.len() > 5
                || after.seq1.len() + after.seq2.len() > 5)
    })
}

/// Joins long character changes separated by a short single-line text, and
/// lets very long changes swallow the few characters left on their lines.
pub(crate) fn remove_very_short_matching_text_between_long_diffs(
    seq1: &CharSliceSequence,
    seq2: &CharSliceSequence,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    const MAX: f64 = 2.0 * 40.0 + 50.0;
    let cap = |v: usize| (v as f64).min(MAX);
    let weight = |seq: &CharSliceSequence, range: OffsetRange| {
        cap(seq.count_lines_in(range) * 40 + range.len()).powf(1.5)
    };

    let diffs = join_until_stable(diffs, |before, after| {
        let unchanged = OffsetRange::new(before.seq1.end_exclusive, after.seq1.start);
        if seq1.count_lines_in(unchanged) > 5 || unchanged.len() > 500 {
            return false;
        }
        let text = seq1.text(unchanged);
        let text = text.trim();
        if text.chars().count() > 20 || text.contains(['\r', '\n']) {
            return false;
        }
        let before_weight = (weight(seq1, before.seq1) + weight(seq2, before.seq2)).powf(1.5);
        let after_weight = (weight(seq1, after.seq1) + weight(seq2, after.seq2)).powf(1.5);
        before_weight + after_weight > MAX.powf(1.5).powf(1.5) * 1.3
    });

    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    let should_mark_as_changed =
        |range: OffsetRange| !range.is_empty() && seq1.trimmed_len_within(range, 3).is_some();
    for (i, current) in diffs.iter().enumerate() {
        let mut extended = *current;
        if current.seq1.len() + current.seq2.len() > 100 {
            let full = seq1.extend_to_full_lines(current.seq1);
            let prefix = OffsetRange::new(full.start, current.seq1.start);
            if should_mark_as_changed(prefix) {
                extended = extended.delta_start(-(prefix.len() as isize));
            }
            let suffix = OffsetRange::new(
                current.seq1.end_exclusive,
                full.end_exclusive.max(current.seq1.end_exclusive),
            );
            if should_mark_as_changed(suffix) {
                extended = extended.delta_end(suffix.len() as isize);
            }
        }

        let available = SequenceDiff::from_offset_pairs(
            i.checked_sub(1)
                .map_or(OffsetPair::ZERO, |p| diffs[p].end_exclusives()),
            diffs
                .get(i + 1)
                .map_or(OffsetPair::new(seq1.len(), seq2.len()), SequenceDiff::starts),
        );
        let clamped = extended.intersect(&available).unwrap_or(*current);
        match result.last_mut() {
            Some(last) if last.end_exclusives() == clamped.starts() => *last = last.join(&clamped),
            _ => result.push(clamped),
        }
    }
    result
}

/// Grows changes to whole words (or subwords) when most of a touched word
/// changed anyway.
///
/// With `force` the word is taken as soon as any part of it changed.
pub(crate) fn extend_diffs_to_entire_word_if_appropriate(
    seq1: &CharSliceSequence,
    seq2: &CharSliceSequence,
    diffs: Vec<SequenceDiff>,
    find_parent: impl Fn(&CharSliceSequence, usize) -> Option<OffsetRange>,
    force: bool,
) -> Vec<SequenceDiff> {
    let mut equal_mappings: VecDeque<SequenceDiff> =
        SequenceDiff::invert(&diffs, seq1.len()).into();
    let mut additional = Vec::new();
    let mut last_point = OffsetPair::ZERO;

    let mut scan_word = |pair: OffsetPair,
                         equal_mapping: &SequenceDiff,
                         equal_mappings: &mut VecDeque<SequenceDiff>| {
        if pair.offset1 < last_point.offset1 || pair.offset2 < last_point.offset2 {
            return;
        }
        let (Some(w1), Some(w2)) = (
            find_parent(seq1, pair.offset1),
            find_parent(seq2, pair.offset2),
        ) else {
            return;
        };
        let mut word = SequenceDiff::new(w1, w2);
        let Some(equal_part) = word.intersect(equal_mapping) else {
            return;
        };
        let mut equal_chars1 = equal_part.seq1.len();
        let mut equal_chars2 = equal_part.seq2.len();

        // The word cannot reach back into equal stretches already scanned,
        // but it can run into the following ones.
        while let Some(next) = equal_mappings.front().copied() {
            if !next.seq1.intersects(&word.seq1) && !next.seq2.intersects(&word.seq2) {
                break;
            }
            let (Some(v1), Some(v2)) = (
                find_parent(seq1, next.seq1.start),
                find_parent(seq2, next.seq2.start),
            ) else {
                break;
            };
            let next_word = SequenceDiff::new(v1, v2);
            let Some(equal_part) = next_word.intersect(&next) else {
                break;
            };
            equal_chars1 += equal_part.seq1.len();
            equal_chars2 += equal_part.seq2.len();
            word = word.join(&next_word);
            if word.seq1.end_exclusive >= next.seq1.end_exclusive {
                equal_mappings.pop_front();
            } else {
                break;
            }
        }

        let equal = equal_chars1 + equal_chars2;
        let total = word.seq1.len() + word.seq2.len();
        if (force && equal < total) || (equal as f64) < (total as f64) * 2.0 / 3.0 {
            additional.push(word);
        }
        last_point = word.end_exclusives();
    };

    while let Some(next) = equal_mappings.pop_front() {
        if next.seq1.is_empty() {
            continue;
        }
        scan_word(next.starts(), &next, &mut equal_mappings);
        // Equal stretches are not empty, so the last element is equal on
        // both sides.
        scan_word(next.end_exclusives().delta(-1), &next, &mut equal_mappings);
    }

    merge_sequence_diffs(diffs, additional)
}

/// Merges two sorted lists of changes, joining the ones that overlap.
pub(crate) fn merge_sequence_diffs(
    diffs1: Vec<SequenceDiff>,
    diffs2: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs1.len() + diffs2.len());
    let mut diffs1 = diffs1.into_iter().peekable();
    let mut diffs2 = diffs2.into_iter().peekable();
    loop {
        let take_first = match (diffs1.peek(), diffs2.peek()) {
            (None, None) => break,
            (Some(d1), Some(d2)) => d1.seq1.start < d2.seq1.start,
            (Some(_), None) => true,
            (None, Some(_)) => false,
        };
        let next = if take_first { diffs1.next() } else { diffs2.next() };
        let Some(next) = next else {
            break;
        };
        match result.last_mut() {
            Some(last) if last.seq1.end_exclusive >= next.seq1.start => *last = last.join(&next),
            _ => result.push(next),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::CharRange;
    use crate::sequence::{trimmed_line_hashes, HashedSequence};
    use pretty_assertions::assert_eq;

    fn sd(seq1: (usize, usize), seq2: (usize, usize)) -> SequenceDiff {
        SequenceDiff::new(OffsetRange::new(seq1.0, seq1.1), OffsetRange::new(seq2.0, seq2.1))
    }

    fn char_sequence(line: &str) -> CharSliceSequence {
        CharSliceSequence::new(&[line], CharRange::new(1, 1, 1, line.chars().count() + 1), true)
    }

    #[test]
    fn joins_changes_by_shifting() {
        // "a" -> "aaa" reported as two separate one-letter insertions
        let a: Vec<char> = "a".chars().collect();
        let b: Vec<char> = "aaa".chars().collect();
        let (s1, s2) = HashedSequence::pair(&a, &b);
        let diffs = vec![sd((0, 0), (0, 1)), sd((1, 1), (2, 3))];
        let joined = join_sequence_diffs_by_shifting(&s1, &s2, diffs);
        assert_eq!(joined, vec![sd((0, 0), (0, 2))]);
    }

    #[test]
    fn insertion_moves_to_blank_line_boundary() {
        let original = ["fn a() {", "    x", "}", "", "fn c() {", "    y", "}"];
        let modified = [
            "fn a() {", "    x", "}", "", "fn b() {", "    z", "}", "", "fn c() {", "    y", "}",
        ];
        let (h1, h2) = trimmed_line_hashes(&original, &modified);
        let s1 = LineSequence::new(h1, &original);
        let s2 = LineSequence::new(h2, &modified);
        // The block is equally valid starting at the closing brace of a().
        let diffs = vec![sd((2, 2), (2, 6))];
        let optimized = optimize_sequence_diffs(&s1, &s2, diffs);
        assert_eq!(optimized, vec![sd((3, 3), (3, 7))]);
    }

    #[test]
    fn short_matches_are_removed() {
        let diffs = vec![sd((0, 1), (0, 1)), sd((3, 4), (3, 4)), sd((8, 9), (8, 9))];
        assert_eq!(
            remove_short_matches(diffs),
            vec![sd((0, 4), (0, 4)), sd((8, 9), (8, 9))]
        );
    }

    #[test]
    fn short_lines_between_large_changes_are_absorbed() {
        let original = ["a", "b", "c", "d", "}", "e", "f"];
        let (h1, _) = trimmed_line_hashes(&original, &[]);
        let s1 = LineSequence::new(h1, &original);
        let diffs = vec![sd((0, 4), (0, 4)), sd((5, 6), (5, 6))];
        assert_eq!(
            remove_very_short_matching_lines_between_diffs(&s1, diffs),
            vec![sd((0, 6), (0, 6))]
        );

        let small = vec![sd((0, 1), (0, 1)), sd((5, 6), (5, 6))];
        assert_eq!(
            remove_very_short_matching_lines_between_diffs(&s1, small.clone()),
            small
        );
    }

    #[test]
    fn long_changes_swallow_short_line_remainders() {
        let long1 = format!("ab{}", "x".repeat(120));
        let long2 = format!("ab{}", "y".repeat(120));
        let (s1, s2) = (char_sequence(&long1), char_sequence(&long2));
        assert_eq!(
            remove_very_short_matching_text_between_long_diffs(
                &s1,
                &s2,
                vec![sd((2, 122), (2, 122))]
            ),
            vec![sd((0, 122), (0, 122))]
        );

        let short1 = format!("ab{}", "x".repeat(10));
        let short2 = format!("ab{}", "y".repeat(10));
        let (s1, s2) = (char_sequence(&short1), char_sequence(&short2));
        assert_eq!(
            remove_very_short_matching_text_between_long_diffs(
                &s1,
                &s2,
                vec![sd((2, 12), (2, 12))]
            ),
            vec![sd((2, 12), (2, 12))]
        );

        let wordy1 = format!("abcd{}", "x".repeat(120));
        let wordy2 = format!("abcd{}", "y".repeat(120));
        let (s1, s2) = (char_sequence(&wordy1), char_sequence(&wordy2));
        assert_eq!(
            remove_very_short_matching_text_between_long_diffs(
                &s1,
                &s2,
                vec![sd((4, 124), (4, 124))]
            ),
            vec![sd((4, 124), (4, 124))]
        );
    }

    #[test]
    fn changes_grow_to_words() {
        let s1 = char_sequence("foo bar");
        let s2 = char_sequence("foo baz");
        let diffs = vec![sd((6, 7), (6, 7))];
        // "ba" is two thirds of "bar", so the word is kept as is
        assert_eq!(
            extend_diffs_to_entire_word_if_appropriate(
                &s1,
                &s2,
                diffs.clone(),
                CharSliceSequence::find_word_containing,
                false
            ),
            diffs
        );
        // forced extension takes the whole word
        assert_eq!(
            extend_diffs_to_entire_word_if_appropriate(
                &s1,
                &s2,
                diffs,
                CharSliceSequence::find_word_containing,
                true
            ),
            vec![sd((4, 7), (4, 7))]
        );

        let s1 = char_sequence("x abcd");
        let s2 = char_sequence("x wxcd");
        let diffs = vec![sd((2, 4), (2, 4))];
        assert_eq!(
            extend_diffs_to_entire_word_if_appropriate(
                &s1,
                &s2,
                diffs,
                CharSliceSequence::find_word_containing,
                false
            ),
            vec![sd((2, 6), (2, 6))]
        );
    }

    #[test]
    fn merge_joins_overlaps() {
        let merged = merge_sequence_diffs(
            vec![sd((0, 2), (0, 2)), sd((6, 7), (6, 7))],
            vec![sd((1, 4), (1, 4))],
        );
        assert_eq!(merged, vec![sd((0, 4), (0, 4)), sd((6, 7), (6, 7))]);
    }
}
