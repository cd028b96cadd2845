// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use tracing::{debug, instrument};

use crate::engine::{diff_sequences, DpScoring};
use crate::heuristics::{
    extend_diffs_to_entire_word_if_appropriate, optimize_sequence_diffs, remove_short_matches,
    remove_very_short_matching_text_between_long_diffs,
};
use crate::lines_diff::DiffOptions;
use crate::mapping::{LineRangeMapping, RangeMapping};
use crate::sequence::{CharSliceSequence, SequenceDiff};
use crate::timeout::Timeout;

/// Line changes spanning more lines than this on both sides combined are
/// not refined to characters.
pub(crate) const MAX_REFINE_LINE_SPAN: usize = 1000;

/// Character sequences shorter than this combined are diffed with dynamic
/// programming.
pub(crate) const CHAR_DP_THRESHOLD: usize = 500;

#[derive(Debug)]
pub(crate) enum Refinement {
    /// Character level changes, in order.
    Chars(Vec<RangeMapping>),
    /// The change is reported as whole lines without inner changes.
    Whole(LineRangeMapping),
}

#[derive(Debug)]
pub(crate) struct RefineResult {
    pub refinement: Refinement,
    pub hit_timeout: bool,
}

/// Diffs the characters of the lines a line level change covers.
#[instrument(skip_all)]
pub(crate) fn refine_diff(
    original: &[&str],
    modified: &[&str],
    diff: &SequenceDiff,
    timeout: &Timeout,
    consider_whitespace_changes: bool,
    options: &DiffOptions,
) -> RefineResult {
    let line_mapping = LineRangeMapping::from_sequence_diff(diff);
    let whole = || RefineResult {
        refinement: Refinement::Whole(line_mapping.clone()),
        hit_timeout: false,
    };

    if diff.seq1.len() + diff.seq2.len() > MAX_REFINE_LINE_SPAN {
        debug!(
            lines = diff.seq1.len() + diff.seq2.len(),
            "change too large to refine"
        );
        return whole();
    }
    let Some(range_mapping) = line_mapping.to_char_range_mapping(original, modified) else {
        return whole();
    };

    let slice1 = CharSliceSequence::new(
        original,
        range_mapping.original,
        consider_whitespace_changes,
    );
    let slice2 = CharSliceSequence::new(
        modified,
        range_mapping.modified,
        consider_whitespace_changes,
    );

    let result = diff_sequences(
        &slice1,
        &slice2,
        timeout,
        CHAR_DP_THRESHOLD,
        DpScoring::PreferRuns(None),
    );

    let mut diffs = optimize_sequence_diffs(&slice1, &slice2, result.diffs);
    if options.compute_moves || options.extend_to_subwords {
        diffs = extend_diffs_to_entire_word_if_appropriate(
            &slice1,
            &slice2,
            diffs,
            CharSliceSequence::find_word_containing,
            false,
        );
    }
    if options.extend_to_subwords {
        diffs = extend_diffs_to_entire_word_if_appropriate(
            &slice1,
            &slice2,
            diffs,
            CharSliceSequence::find_subword_containing,
            true,
        );
    }
    diffs = remove_short_matches(diffs);
    diffs = remove_very_short_matching_text_between_long_diffs(&slice1, &slice2, diffs);

    let mappings = diffs
        .iter()
        .map(|d| {
            RangeMapping::new(
                slice1.translate_range(d.seq1),
                slice2.translate_range(d.seq2),
            )
        })
        .collect();
    RefineResult {
        refinement: Refinement::Chars(mappings),
        hit_timeout: result.hit_timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{CharRange, LineRange};
    use crate::sequence::OffsetRange;
    use pretty_assertions::assert_eq;

    fn line_diff(seq1: (usize, usize), seq2: (usize, usize)) -> SequenceDiff {
        SequenceDiff::new(
            OffsetRange::new(seq1.0, seq1.1),
            OffsetRange::new(seq2.0, seq2.1),
        )
    }

    fn refine(
        original: &[&str],
        modified: &[&str],
        diff: SequenceDiff,
        options: &DiffOptions,
    ) -> Vec<RangeMapping> {
        let result = refine_diff(
            original,
            modified,
            &diff,
            &Timeout::unlimited(),
            !options.ignore_trim_whitespace,
            options,
        );
        assert!(!result.hit_timeout);
        match result.refinement {
            Refinement::Chars(mappings) => mappings,
            Refinement::Whole(mapping) => panic!("unexpected whole line change {mapping}"),
        }
    }

    #[test]
    fn single_character_change() {
        let original = ["let x = 1;"];
        let modified = ["let y = 1;"];
        let mappings = refine(
            &original,
            &modified,
            line_diff((0, 1), (0, 1)),
            &DiffOptions::default(),
        );
        assert_eq!(
            mappings,
            vec![RangeMapping::new(
                CharRange::new(1, 5, 1, 6),
                CharRange::new(1, 5, 1, 6)
            )]
        );
    }

    #[test]
    fn inserted_line_at_end() {
        let original = ["a"];
        let modified = ["a", "b"];
        let mappings = refine(
            &original,
            &modified,
            line_diff((1, 1), (1, 2)),
            &DiffOptions::default(),
        );
        assert_eq!(
            mappings,
            vec![RangeMapping::new(
                CharRange::new(1, 2, 1, 2),
                CharRange::new(1, 2, 2, 2)
            )]
        );
    }

    #[test]
    fn subwords_extend_to_camel_case_humps() {
        let original = ["fooBarBaz"];
        let modified = ["fooBazBaz"];
        let options = DiffOptions {
            extend_to_subwords: true,
            ..DiffOptions::default()
        };
        let mappings = refine(&original, &modified, line_diff((0, 1), (0, 1)), &options);
        assert_eq!(
            mappings,
            vec![RangeMapping::new(
                CharRange::new(1, 4, 1, 7),
                CharRange::new(1, 4, 1, 7)
            )]
        );
    }

    #[test]
    fn huge_changes_are_not_refined() {
        let original: Vec<String> = (0..600).map(|i| format!("old {i}")).collect();
        let modified: Vec<String> = (0..600).map(|i| format!("new {i}")).collect();
        let original: Vec<&str> = original.iter().map(String::as_str).collect();
        let modified: Vec<&str> = modified.iter().map(String::as_str).collect();
        let result = refine_diff(
            &original,
            &modified,
            &line_diff((0, 600), (0, 600)),
            &Timeout::unlimited(),
            true,
            &DiffOptions::default(),
        );
        match result.refinement {
            Refinement::Whole(mapping) => {
                assert_eq!(mapping.original, LineRange::new(1, 601));
                assert!(mapping.inner_changes.is_empty());
            }
            Refinement::Chars(_) => panic!("expected a whole line change"),
        }
    }
}
