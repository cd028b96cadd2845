// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::mem;

use tracing::{debug, info, instrument, trace};

use crate::engine::{diff_sequences, DpScoring};
use crate::heuristics::{optimize_sequence_diffs, remove_very_short_matching_lines_between_diffs};
use crate::mapping::{
    line_range_mappings_from_range_mappings, CharRange, LineRange, LineRangeMapping, RangeMapping,
};
use crate::moves::{compute_moves, MovedText};
use crate::refine::{refine_diff, Refinement};
use crate::sequence::{trimmed_line_hashes, LineSequence, OffsetRange, SequenceDiff};
use crate::timeout::Timeout;

/// Line sequences shorter than this combined are diffed with dynamic
/// programming.
pub(crate) const LINE_DP_THRESHOLD: usize = 1700;

/// Knobs for a single diff computation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Changes in leading or trailing whitespace of a line are not reported.
    pub ignore_trim_whitespace: bool,
    /// Time budget in milliseconds; `0` means unlimited.
    pub max_computation_time_ms: u64,
    /// Detect blocks of lines that were moved.
    pub compute_moves: bool,
    /// Grow character changes to camel case subwords.
    pub extend_to_subwords: bool,
}

impl DiffOptions {
    /// Sets the time budget; negative values mean unlimited.
    pub fn with_max_computation_time_ms(mut self, max_ms: i64) -> Self {
        self.max_computation_time_ms = u64::try_from(max_ms).unwrap_or(0);
        self
    }
}

/// The result of [`compute_diff`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinesDiff {
    /// Sorted and non-overlapping on both sides.
    pub changes: Vec<LineRangeMapping>,
    pub moves: Vec<MovedText>,
    /// The time budget ran out and the changes may not be minimal.
    pub hit_timeout: bool,
}

impl LinesDiff {
    pub fn is_identical(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Refines line changes and collects the results into hunks, in order.
struct HunkBuilder<'a> {
    original: &'a [&'a str],
    modified: &'a [&'a str],
    timeout: &'a Timeout,
    consider_whitespace_changes: bool,
    options: &'a DiffOptions,
    pending: Vec<RangeMapping>,
    hunks: Vec<LineRangeMapping>,
    hit_timeout: bool,
}

impl<'a> HunkBuilder<'a> {
    fn refine(&mut self, diff: &SequenceDiff) {
        let refined = refine_diff(
            self.original,
            self.modified,
            diff,
            self.timeout,
            self.consider_whitespace_changes,
            self.options,
        );
        self.hit_timeout |= refined.hit_timeout;
        match refined.refinement {
            Refinement::Chars(mappings) => self.pending.extend(mappings),
            Refinement::Whole(mapping) => {
                self.flush();
                self.hunks.push(mapping);
            }
        }
    }

    /// Lines with equal hashes can still differ in whitespace.
    fn scan_for_whitespace_changes(&mut self, start1: usize, start2: usize, count: usize) {
        if !self.consider_whitespace_changes {
            return;
        }
        for i in 0..count {
            let (offset1, offset2) = (start1 + i, start2 + i);
            if self.original[offset1] != self.modified[offset2] {
                trace!(line = offset1 + 1, "whitespace only change");
                self.refine(&SequenceDiff::new(
                    OffsetRange::new(offset1, offset1 + 1),
                    OffsetRange::new(offset2, offset2 + 1),
                ));
            }
        }
    }

    fn flush(&mut self) {
        let pending = mem::take(&mut self.pending);
        self.hunks.extend(line_range_mappings_from_range_mappings(
            &pending,
            self.original,
            self.modified,
        ));
    }

    fn finish(mut self) -> (Vec<LineRangeMapping>, bool) {
        self.flush();
        (self.hunks, self.hit_timeout)
    }
}

fn is_single_empty_line(lines: &[&str]) -> bool {
    matches!(lines, [line] if line.is_empty())
}

fn whole_document_range(lines: &[&str]) -> CharRange {
    let last = lines.len().max(1);
    let last_length = lines.last().map_or(0, |l| l.chars().count());
    CharRange::new(1, 1, last, last_length + 1)
}

/// Diffs two documents given as lines (without line terminators).
///
/// Lines are aligned first; every changed block of lines is then refined to
/// the characters that changed inside it.
#[instrument(skip_all)]
pub fn compute_diff<S: AsRef<str>>(
    original_lines: &[S],
    modified_lines: &[S],
    options: &DiffOptions,
) -> LinesDiff {
    let original: Vec<&str> = original_lines.iter().map(AsRef::as_ref).collect();
    let modified: Vec<&str> = modified_lines.iter().map(AsRef::as_ref).collect();
    info!(
        original_lines = original.len(),
        modified_lines = modified.len()
    );

    if original.len() <= 1 && original == modified {
        return LinesDiff::default();
    }
    if original.is_empty()
        || modified.is_empty()
        || is_single_empty_line(&original)
        || is_single_empty_line(&modified)
    {
        debug!("empty document, reporting a single change");
        return LinesDiff {
            changes: vec![LineRangeMapping::new(
                LineRange::new(1, original.len() + 1),
                LineRange::new(1, modified.len() + 1),
                vec![RangeMapping::new(
                    whole_document_range(&original),
                    whole_document_range(&modified),
                )],
            )],
            moves: Vec::new(),
            hit_timeout: false,
        };
    }

    let timeout = Timeout::new(options.max_computation_time_ms);

    let (hashes1, hashes2) = trimmed_line_hashes(&original, &modified);
    let seq1 = LineSequence::new(hashes1, &original);
    let seq2 = LineSequence::new(hashes2, &modified);

    // Long identical lines anchor the alignment more than short or blank
    // ones; lines equal only once trimmed count a little less than 1.
    let line_score = |offset1: usize, offset2: usize| -> f64 {
        let line = modified[offset2];
        if original[offset1] != line {
            0.99
        } else if line.is_empty() {
            0.1
        } else {
            1.0 + (1.0 + line.chars().count() as f64).ln()
        }
    };
    let alignment = diff_sequences(
        &seq1,
        &seq2,
        &timeout,
        LINE_DP_THRESHOLD,
        DpScoring::PreferRuns(Some(&line_score)),
    );
    let mut hit_timeout = alignment.hit_timeout;

    let line_diffs = optimize_sequence_diffs(&seq1, &seq2, alignment.diffs);
    let line_diffs = remove_very_short_matching_lines_between_diffs(&seq1, line_diffs);
    debug!(line_changes = line_diffs.len(), "lines aligned");

    let mut hunks = HunkBuilder {
        original: &original,
        modified: &modified,
        timeout: &timeout,
        consider_whitespace_changes: !options.ignore_trim_whitespace,
        options,
        pending: Vec::new(),
        hunks: Vec::new(),
        hit_timeout: false,
    };
    let (mut last1, mut last2) = (0, 0);
    for diff in &line_diffs {
        debug_assert_eq!(diff.seq1.start - last1, diff.seq2.start - last2);
        hunks.scan_for_whitespace_changes(last1, last2, diff.seq1.start - last1);
        last1 = diff.seq1.end_exclusive;
        last2 = diff.seq2.end_exclusive;
        hunks.refine(diff);
    }
    hunks.scan_for_whitespace_changes(last1, last2, original.len() - last1);
    let (changes, refine_hit_timeout) = hunks.finish();
    hit_timeout |= refine_hit_timeout;

    let moves = if options.compute_moves {
        let moves = compute_moves(
            &changes,
            &original,
            &modified,
            &timeout,
            !options.ignore_trim_whitespace,
            options,
        );
        hit_timeout |= moves.hit_timeout;
        moves.moves
    } else {
        Vec::new()
    };

    info!(
        changes = changes.len(),
        moves = moves.len(),
        hit_timeout = hit_timeout,
        "diff computed"
    );
    LinesDiff {
        changes,
        moves,
        hit_timeout,
    }
}
