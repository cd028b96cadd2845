// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! Sequences the diff engine runs on, and the offset vocabulary shared by
//! the engine and the heuristics.
//!
//! Every sequence exposes its elements as `u32` values so equality is a
//! single integer comparison: lines are replaced by perfect hashes of their
//! trimmed text, characters by their Unicode scalar value.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use crate::mapping::{CharRange, Position};

/// An ordered, indexable collection of comparable elements.
pub trait Sequence {
    fn element(&self, offset: usize) -> u32;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Equality of the underlying content, which can be stricter than
    /// equality of the hashed elements (e.g. lines that only match once
    /// trimmed).
    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        self.element(offset1) == self.element(offset2)
    }

    /// How good a place the boundary before element `length` is for a
    /// change to start or end. Sequences without a notion of boundary
    /// quality return `None` and are never shifted.
    fn boundary_score(&self, _length: usize) -> Option<i32> {
        None
    }
}

/// Half-open range `[start, end_exclusive)` of 0-based offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OffsetRange {
    pub start: usize,
    pub end_exclusive: usize,
}

impl OffsetRange {
    pub fn new(start: usize, end_exclusive: usize) -> Self {
        debug_assert!(
            start <= end_exclusive,
            "invalid offset range [{start}, {end_exclusive})"
        );
        Self {
            start,
            end_exclusive,
        }
    }

    pub fn empty_at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end_exclusive - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end_exclusive
    }

    pub fn join(&self, other: &OffsetRange) -> OffsetRange {
        OffsetRange::new(
            self.start.min(other.start),
            self.end_exclusive.max(other.end_exclusive),
        )
    }

    /// The common part of both ranges; touching ranges intersect in an
    /// empty range.
    pub fn intersect(&self, other: &OffsetRange) -> Option<OffsetRange> {
        let start = self.start.max(other.start);
        let end = self.end_exclusive.min(other.end_exclusive);
        (start <= end).then(|| OffsetRange::new(start, end))
    }

    /// Whether the ranges share at least one offset.
    pub fn intersects(&self, other: &OffsetRange) -> bool {
        self.start.max(other.start) < self.end_exclusive.min(other.end_exclusive)
    }

    pub fn delta(&self, offset: isize) -> OffsetRange {
        OffsetRange::new(
            self.start.saturating_add_signed(offset),
            self.end_exclusive.saturating_add_signed(offset),
        )
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end_exclusive
    }
}

impl From<Range<usize>> for OffsetRange {
    fn from(range: Range<usize>) -> Self {
        OffsetRange::new(range.start, range.end)
    }
}

/// A point in both sequences at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OffsetPair {
    pub offset1: usize,
    pub offset2: usize,
}

impl OffsetPair {
    pub const ZERO: OffsetPair = OffsetPair {
        offset1: 0,
        offset2: 0,
    };

    pub fn new(offset1: usize, offset2: usize) -> Self {
        Self { offset1, offset2 }
    }

    pub fn delta(&self, offset: isize) -> OffsetPair {
        OffsetPair::new(
            self.offset1.saturating_add_signed(offset),
            self.offset2.saturating_add_signed(offset),
        )
    }
}

/// One aligned change between two sequences, in the uniform shape the
/// algorithms work with. Either range may be empty, never both in output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SequenceDiff {
    pub seq1: OffsetRange,
    pub seq2: OffsetRange,
}

impl SequenceDiff {
    pub fn new(seq1: OffsetRange, seq2: OffsetRange) -> Self {
        Self { seq1, seq2 }
    }

    pub fn from_offset_pairs(start: OffsetPair, end_exclusive: OffsetPair) -> Self {
        Self::new(
            OffsetRange::new(start.offset1, end_exclusive.offset1),
            OffsetRange::new(start.offset2, end_exclusive.offset2),
        )
    }

    /// The equal stretches around `diffs`, assuming they are sorted.
    pub fn invert(diffs: &[SequenceDiff], seq1_len: usize) -> Vec<SequenceDiff> {
        let mut result = Vec::with_capacity(diffs.len() + 1);
        let mut previous: Option<&SequenceDiff> = None;
        for diff in diffs.iter().map(Some).chain(std::iter::once(None)) {
            let start = previous.map_or(OffsetPair::ZERO, SequenceDiff::end_exclusives);
            let end = match diff {
                Some(diff) => diff.starts(),
                None => {
                    let shift = previous.map_or(0, |p| {
                        p.seq2.end_exclusive as isize - p.seq1.end_exclusive as isize
                    });
                    OffsetPair::new(seq1_len, seq1_len.saturating_add_signed(shift))
                }
            };
            result.push(SequenceDiff::from_offset_pairs(start, end));
            previous = diff;
        }
        result
    }

    pub fn swap(&self) -> SequenceDiff {
        SequenceDiff::new(self.seq2, self.seq1)
    }

    pub fn join(&self, other: &SequenceDiff) -> SequenceDiff {
        SequenceDiff::new(self.seq1.join(&other.seq1), self.seq2.join(&other.seq2))
    }

    pub fn delta(&self, offset: isize) -> SequenceDiff {
        if offset == 0 {
            return *self;
        }
        SequenceDiff::new(self.seq1.delta(offset), self.seq2.delta(offset))
    }

    pub fn delta_start(&self, offset: isize) -> SequenceDiff {
        SequenceDiff::new(
            OffsetRange::new(
                self.seq1.start.saturating_add_signed(offset),
                self.seq1.end_exclusive,
            ),
            OffsetRange::new(
                self.seq2.start.saturating_add_signed(offset),
                self.seq2.end_exclusive,
            ),
        )
    }

    pub fn delta_end(&self, offset: isize) -> SequenceDiff {
        SequenceDiff::new(
            OffsetRange::new(
                self.seq1.start,
                self.seq1.end_exclusive.saturating_add_signed(offset),
            ),
            OffsetRange::new(
                self.seq2.start,
                self.seq2.end_exclusive.saturating_add_signed(offset),
            ),
        )
    }

    pub fn intersect(&self, other: &SequenceDiff) -> Option<SequenceDiff> {
        let seq1 = self.seq1.intersect(&other.seq1)?;
        let seq2 = self.seq2.intersect(&other.seq2)?;
        Some(SequenceDiff::new(seq1, seq2))
    }

    pub fn starts(&self) -> OffsetPair {
        OffsetPair::new(self.seq1.start, self.seq2.start)
    }

    pub fn end_exclusives(&self) -> OffsetPair {
        OffsetPair::new(self.seq1.end_exclusive, self.seq2.end_exclusive)
    }
}

/// Arbitrary hashable items, replaced by dense ids shared by both sides.
pub(crate) struct HashedSequence {
    hashes: Vec<u32>,
}

impl HashedSequence {
    pub fn pair<T: Hash + Eq>(original: &[T], modified: &[T]) -> (Self, Self) {
        let mut ids: HashMap<&T, u32> = HashMap::new();
        let mut id_of = |item| {
            let next = ids.len() as u32;
            *ids.entry(item).or_insert(next)
        };
        let original = original.iter().map(&mut id_of).collect();
        let modified = modified.iter().map(&mut id_of).collect();
        (Self { hashes: original }, Self { hashes: modified })
    }
}

impl Sequence for HashedSequence {
    fn element(&self, offset: usize) -> u32 {
        self.hashes[offset]
    }

    fn len(&self) -> usize {
        self.hashes.len()
    }
}

/// Perfect hashes of the trimmed lines of both documents.
pub(crate) fn trimmed_line_hashes<'a>(
    original: &[&'a str],
    modified: &[&'a str],
) -> (Vec<u32>, Vec<u32>) {
    let mut ids: HashMap<&'a str, u32> = HashMap::new();
    let mut id_of = |line: &&'a str| {
        let next = ids.len() as u32;
        *ids.entry(line.trim()).or_insert(next)
    };
    let original = original.iter().map(&mut id_of).collect();
    let modified = modified.iter().map(&mut id_of).collect();
    (original, modified)
}

pub(crate) struct LineSequence<'a> {
    hashes: Vec<u32>,
    lines: &'a [&'a str],
}

impl<'a> LineSequence<'a> {
    pub fn new(hashes: Vec<u32>, lines: &'a [&'a str]) -> Self {
        debug_assert_eq!(hashes.len(), lines.len());
        Self { hashes, lines }
    }

    pub fn text(&self, range: OffsetRange) -> String {
        self.lines[range.as_range()].join("\n")
    }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

impl Sequence for LineSequence<'_> {
    fn element(&self, offset: usize) -> u32 {
        self.hashes[offset]
    }

    fn len(&self) -> usize {
        self.hashes.len()
    }

    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        self.lines[offset1] == self.lines[offset2]
    }

    // Blank and shallow lines make the best hunk borders.
    fn boundary_score(&self, length: usize) -> Option<i32> {
        let before = if length == 0 {
            0
        } else {
            indentation(self.lines[length - 1])
        };
        let after = if length == self.lines.len() {
            0
        } else {
            indentation(self.lines[length])
        };
        Some(1000 - (before + after) as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharBoundaryCategory {
    WordLower,
    WordUpper,
    WordNumber,
    End,
    Other,
    Separator,
    Space,
    LineBreakCR,
    LineBreakLF,
}

impl CharBoundaryCategory {
    fn of(element: Option<u32>) -> Self {
        let Some(element) = element else {
            return Self::End;
        };
        match char::from_u32(element) {
            Some('\n') => Self::LineBreakLF,
            Some('\r') => Self::LineBreakCR,
            Some(' ' | '\t') => Self::Space,
            Some('a'..='z') => Self::WordLower,
            Some('A'..='Z') => Self::WordUpper,
            Some('0'..='9') => Self::WordNumber,
            Some(',' | ';') => Self::Separator,
            _ => Self::Other,
        }
    }

    fn score(self) -> i32 {
        match self {
            Self::WordLower | Self::WordUpper | Self::WordNumber => 0,
            Self::End => 10,
            Self::Other => 2,
            Self::Separator => 30,
            Self::Space => 3,
            Self::LineBreakCR | Self::LineBreakLF => 10,
        }
    }
}

/// Which side of a line start an offset translates to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Preference {
    Left,
    Right,
}

fn is_word_char(element: u32) -> bool {
    char::from_u32(element).is_some_and(|c| c.is_ascii_alphanumeric())
}

fn is_upper_case(element: u32) -> bool {
    char::from_u32(element).is_some_and(|c| c.is_ascii_uppercase())
}

/// The characters of a range of lines, joined by `\n`.
///
/// When whitespace changes are ignored every line is trimmed before its
/// characters are taken, and the trimmed lengths are remembered so offsets
/// translate back to the right columns.
pub(crate) struct CharSliceSequence {
    elements: Vec<u32>,
    first_element_offset_by_line: Vec<usize>,
    line_start_offsets: Vec<usize>,
    trimmed_ws_lengths: Vec<usize>,
    start_line: usize,
}

impl CharSliceSequence {
    pub fn new(lines: &[&str], range: CharRange, consider_whitespace_changes: bool) -> Self {
        let mut elements = Vec::new();
        let mut first_element_offset_by_line = vec![0];
        let mut line_start_offsets = Vec::new();
        let mut trimmed_ws_lengths = Vec::new();

        for line_number in range.start_line..=range.end_line {
            let full: Vec<char> = line_number
                .checked_sub(1)
                .and_then(|index| lines.get(index))
                .map(|line| line.chars().collect())
                .unwrap_or_default();
            let mut line = full.as_slice();

            let mut line_start_offset = 0;
            if line_number == range.start_line && range.start_column > 1 {
                line_start_offset = range.start_column - 1;
                line = &line[line_start_offset.min(line.len())..];
            }
            line_start_offsets.push(line_start_offset);

            let mut trimmed_ws_length = 0;
            if !consider_whitespace_changes {
                trimmed_ws_length = line.iter().take_while(|c| c.is_whitespace()).count();
                line = &line[trimmed_ws_length..];
                let trailing = line.iter().rev().take_while(|c| c.is_whitespace()).count();
                line = &line[..line.len() - trailing];
            }
            trimmed_ws_lengths.push(trimmed_ws_length);

            let line_length = if line_number == range.end_line {
                let available = range.end_column as isize
                    - 1
                    - line_start_offset as isize
                    - trimmed_ws_length as isize;
                available.clamp(0, line.len() as isize) as usize
            } else {
                line.len()
            };
            elements.extend(line[..line_length].iter().map(|&c| c as u32));

            if line_number < range.end_line {
                elements.push('\n' as u32);
                first_element_offset_by_line.push(elements.len());
            }
        }

        Self {
            elements,
            first_element_offset_by_line,
            line_start_offsets,
            trimmed_ws_lengths,
            start_line: range.start_line,
        }
    }

    pub fn text(&self, range: OffsetRange) -> String {
        self.elements[range.as_range()]
            .iter()
            .filter_map(|&e| char::from_u32(e))
            .collect()
    }

    /// Length of the text in `range` without surrounding whitespace, or
    /// `None` once it is known to exceed `limit`.
    ///
    /// Stops early on the first non-whitespace character past the limit,
    /// so long ranges are cheap unless they are mostly whitespace.
    pub fn trimmed_len_within(&self, range: OffsetRange, limit: usize) -> Option<usize> {
        let elements = &self.elements[range.as_range()];
        let is_space = |e: &u32| char::from_u32(*e).is_some_and(char::is_whitespace);
        let mut significant = 0;
        for element in elements {
            if !is_space(element) {
                significant += 1;
                if significant > limit {
                    return None;
                }
            }
        }
        let Some(first) = elements.iter().position(|e| !is_space(e)) else {
            return Some(0);
        };
        let last = elements.iter().rposition(|e| !is_space(e)).unwrap_or(first);
        let trimmed = last + 1 - first;
        (trimmed <= limit).then_some(trimmed)
    }

    fn line_index_of(&self, offset: usize) -> usize {
        // The first entry is 0, so the partition point is at least 1.
        self.first_element_offset_by_line
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    pub fn translate_offset(&self, offset: usize, preference: Preference) -> Position {
        let index = self.line_index_of(offset);
        let line_offset = offset - self.first_element_offset_by_line[index];
        let trimmed = if line_offset == 0 && preference == Preference::Left {
            0
        } else {
            self.trimmed_ws_lengths[index]
        };
        Position::new(
            self.start_line + index,
            1 + self.line_start_offsets[index] + line_offset + trimmed,
        )
    }

    pub fn translate_range(&self, range: OffsetRange) -> CharRange {
        let start = self.translate_offset(range.start, Preference::Right);
        let end = self.translate_offset(range.end_exclusive, Preference::Left);
        if end < start {
            CharRange::from_positions(end, end)
        } else {
            CharRange::from_positions(start, end)
        }
    }

    pub fn count_lines_in(&self, range: OffsetRange) -> usize {
        let end = self.translate_offset(range.end_exclusive, Preference::Right);
        let start = self.translate_offset(range.start, Preference::Right);
        end.line - start.line
    }

    pub fn extend_to_full_lines(&self, range: OffsetRange) -> OffsetRange {
        let starts = &self.first_element_offset_by_line;
        let start = starts[self.line_index_of(range.start)];
        let end_index = starts.partition_point(|&start| start < range.end_exclusive);
        let end = starts
            .get(end_index)
            .copied()
            .unwrap_or(self.elements.len());
        OffsetRange::new(start, end.max(start))
    }

    pub fn find_word_containing(&self, offset: usize) -> Option<OffsetRange> {
        if offset >= self.elements.len() || !is_word_char(self.elements[offset]) {
            return None;
        }
        let mut start = offset;
        while start > 0 && is_word_char(self.elements[start - 1]) {
            start -= 1;
        }
        let mut end = offset;
        while end < self.elements.len() && is_word_char(self.elements[end]) {
            end += 1;
        }
        Some(OffsetRange::new(start, end))
    }

    /// Like [`Self::find_word_containing`], but camel case humps split words.
    pub fn find_subword_containing(&self, offset: usize) -> Option<OffsetRange> {
        if offset >= self.elements.len() || !is_word_char(self.elements[offset]) {
            return None;
        }
        let mut start = offset;
        while start > 0
            && is_word_char(self.elements[start - 1])
            && !is_upper_case(self.elements[start])
        {
            start -= 1;
        }
        let mut end = offset + 1;
        while end < self.elements.len()
            && is_word_char(self.elements[end])
            && !is_upper_case(self.elements[end])
        {
            end += 1;
        }
        Some(OffsetRange::new(start, end))
    }
}

impl Sequence for CharSliceSequence {
    fn element(&self, offset: usize) -> u32 {
        self.elements[offset]
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn boundary_score(&self, length: usize) -> Option<i32> {
        let previous = CharBoundaryCategory::of(
            length
                .checked_sub(1)
                .and_then(|i| self.elements.get(i).copied()),
        );
        let next = CharBoundaryCategory::of(self.elements.get(length).copied());

        if previous == CharBoundaryCategory::LineBreakCR
            && next == CharBoundaryCategory::LineBreakLF
        {
            // never split a CRLF pair
            return Some(0);
        }
        if previous == CharBoundaryCategory::LineBreakLF {
            return Some(150);
        }

        let mut score = 0;
        if previous != next {
            score += 10;
            if previous == CharBoundaryCategory::WordLower
                && next == CharBoundaryCategory::WordUpper
            {
                score += 1;
            }
        }
        score += previous.score();
        score += next.score();
        Some(score)
    }
}
