// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::lines_diff::DiffOptions;
use crate::mapping::{line_range_mappings_from_range_mappings, LineRange, LineRangeMapping};
use crate::refine::{refine_diff, Refinement};
use crate::timeout::Timeout;

/// Only blocks of at least this many lines are considered for moves.
const MIN_MOVED_LINES: usize = 3;

/// A deleted and an inserted block are a move when their character
/// histograms are more similar than this.
const MIN_SIMILARITY: f64 = 0.90;

/// A block of lines that was moved, and how it changed on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovedText {
    /// Where the block was and where it went; never has inner changes.
    pub line_range_mapping: LineRangeMapping,
    /// The diff between the block and its destination.
    pub changes: Vec<LineRangeMapping>,
}

pub(crate) struct MovesResult {
    pub moves: Vec<MovedText>,
    pub hit_timeout: bool,
}

/// Character counts of a block of lines, line breaks included.
struct Fragment {
    range: LineRange,
    histogram: HashMap<char, usize>,
    total: usize,
}

impl Fragment {
    fn new(range: LineRange, lines: &[&str]) -> Self {
        let mut histogram = HashMap::new();
        let mut total = 0;
        for line in range.slice(lines) {
            for c in line.chars().chain(std::iter::once('\n')) {
                *histogram.entry(c).or_insert(0) += 1;
                total += 1;
            }
        }
        Self {
            range,
            histogram,
            total,
        }
    }

    /// 1 for identical histograms, down to 0 for disjoint ones.
    fn similarity(&self, other: &Fragment) -> f64 {
        let mut differences = 0;
        for (c, &count) in &self.histogram {
            differences += count.abs_diff(other.histogram.get(c).copied().unwrap_or(0));
        }
        for (c, &count) in &other.histogram {
            if !self.histogram.contains_key(c) {
                differences += count;
            }
        }
        1.0 - differences as f64 / (self.total + other.total) as f64
    }
}

/// Pairs pure deletions with the most similar pure insertion.
#[instrument(skip_all)]
pub(crate) fn compute_moves(
    changes: &[LineRangeMapping],
    original: &[&str],
    modified: &[&str],
    timeout: &Timeout,
    consider_whitespace_changes: bool,
    options: &DiffOptions,
) -> MovesResult {
    let deletions: Vec<Fragment> = changes
        .iter()
        .filter(|c| c.modified.is_empty() && c.original.len() >= MIN_MOVED_LINES)
        .map(|c| Fragment::new(c.original, original))
        .collect();
    let mut insertions: Vec<Option<Fragment>> = changes
        .iter()
        .filter(|c| c.original.is_empty() && c.modified.len() >= MIN_MOVED_LINES)
        .map(|c| Some(Fragment::new(c.modified, modified)))
        .collect();

    let mut pairs = Vec::new();
    for deletion in &deletions {
        let best = insertions
            .iter()
            .enumerate()
            .filter_map(|(i, insertion)| {
                insertion
                    .as_ref()
                    .map(|insertion| (i, deletion.similarity(insertion)))
            })
            .fold(None, |best: Option<(usize, f64)>, (i, similarity)| match best {
                Some((_, highest)) if highest >= similarity => best,
                _ => Some((i, similarity)),
            });
        if let Some((i, similarity)) = best {
            if similarity > MIN_SIMILARITY {
                if let Some(insertion) = insertions[i].take() {
                    debug!(
                        from = %deletion.range,
                        to = %insertion.range,
                        similarity = similarity,
                        "moved block"
                    );
                    pairs.push((deletion.range, insertion.range));
                }
            }
        }
        if !timeout.is_valid() {
            break;
        }
    }

    let mut hit_timeout = false;
    let moves = pairs
        .into_iter()
        .map(|(from, to)| {
            let mapping = LineRangeMapping::new(from, to, Vec::new());
            let refined = refine_diff(
                original,
                modified,
                &mapping.to_sequence_diff(),
                timeout,
                consider_whitespace_changes,
                options,
            );
            hit_timeout |= refined.hit_timeout;
            let changes = match refined.refinement {
                Refinement::Chars(mappings) => {
                    line_range_mappings_from_range_mappings(&mappings, original, modified)
                }
                Refinement::Whole(whole) => vec![whole],
            };
            MovedText {
                line_range_mapping: mapping,
                changes,
            }
        })
        .collect();
    MovesResult { moves, hit_timeout }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn similarity_of_blocks() {
        let lines = ["abc", "abc", "xyz"];
        let a = Fragment::new(LineRange::new(1, 2), &lines);
        let b = Fragment::new(LineRange::new(2, 3), &lines);
        let c = Fragment::new(LineRange::new(3, 4), &lines);
        assert_eq!(a.similarity(&b), 1.0);
        // only the line breaks are shared
        assert_eq!(a.similarity(&c), 1.0 - 6.0 / 8.0);
    }

    #[test]
    fn moved_block_is_paired() {
        let original = ["one", "two", "three", "x", "y"];
        let modified = ["x", "y", "one", "two", "three"];
        let changes = vec![
            LineRangeMapping::new(LineRange::new(1, 4), LineRange::new(1, 1), vec![]),
            LineRangeMapping::new(LineRange::new(6, 6), LineRange::new(3, 6), vec![]),
        ];
        let result = compute_moves(
            &changes,
            &original,
            &modified,
            &Timeout::unlimited(),
            true,
            &DiffOptions::default(),
        );
        assert_eq!(result.moves.len(), 1);
        let moved = &result.moves[0];
        assert_eq!(moved.line_range_mapping.original, LineRange::new(1, 4));
        assert_eq!(moved.line_range_mapping.modified, LineRange::new(3, 6));
        assert!(moved.changes.is_empty());
    }

    #[test]
    fn short_or_dissimilar_blocks_are_not_moves() {
        let original = ["aaaa", "bbbb", "cccc", "k"];
        let modified = ["k", "wxyz", "wxyz", "wxyz"];
        let changes = vec![
            LineRangeMapping::new(LineRange::new(1, 4), LineRange::new(1, 1), vec![]),
            LineRangeMapping::new(LineRange::new(5, 5), LineRange::new(2, 5), vec![]),
        ];
        let result = compute_moves(
            &changes,
            &original,
            &modified,
            &Timeout::unlimited(),
            true,
            &DiffOptions::default(),
        );
        assert!(result.moves.is_empty());
    }
}
