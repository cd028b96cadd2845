// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! The 1-based structures handed to callers, and the stateless conversions
//! from engine offsets into them.

use std::fmt;

use crate::engine::SequenceChange;
use crate::sequence::{OffsetRange, SequenceDiff};

/// 1-based half-open range of lines `[start_line, end_line_exclusive)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start_line: usize,
    pub end_line_exclusive: usize,
}

impl LineRange {
    pub fn new(start_line: usize, end_line_exclusive: usize) -> Self {
        debug_assert!(start_line >= 1, "line numbers start at 1");
        debug_assert!(
            start_line <= end_line_exclusive,
            "invalid line range [{start_line},{end_line_exclusive})"
        );
        Self {
            start_line,
            end_line_exclusive,
        }
    }

    /// Converts 0-based line offsets.
    pub fn from_offsets(range: OffsetRange) -> Self {
        Self::new(range.start + 1, range.end_exclusive + 1)
    }

    pub fn to_offsets(&self) -> OffsetRange {
        OffsetRange::new(self.start_line - 1, self.end_line_exclusive - 1)
    }

    pub fn len(&self) -> usize {
        self.end_line_exclusive - self.start_line
    }

    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line_exclusive
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line < self.end_line_exclusive
    }

    pub fn join(&self, other: &LineRange) -> LineRange {
        LineRange::new(
            self.start_line.min(other.start_line),
            self.end_line_exclusive.max(other.end_line_exclusive),
        )
    }

    pub fn overlaps_or_touches(&self, other: &LineRange) -> bool {
        self.start_line <= other.end_line_exclusive && other.start_line <= self.end_line_exclusive
    }

    pub fn delta(&self, offset: isize) -> LineRange {
        LineRange::new(
            self.start_line.saturating_add_signed(offset),
            self.end_line_exclusive.saturating_add_signed(offset),
        )
    }

    /// The slice of `lines` this range covers, clamped to its length.
    pub fn slice<'a, S>(&self, lines: &'a [S]) -> &'a [S] {
        let end = (self.end_line_exclusive - 1).min(lines.len());
        let start = (self.start_line - 1).min(end);
        &lines[start..end]
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.start_line, self.end_line_exclusive)
    }
}

/// 1-based line and column; columns count Unicode scalar values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// 1-based character range, end exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CharRange {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl CharRange {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn from_positions(start: Position, end: Position) -> Self {
        Self::new(start.line, start.column, end.line, end.column)
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{} -> {},{})",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// A character level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeMapping {
    pub original: CharRange,
    pub modified: CharRange,
}

impl RangeMapping {
    pub fn new(original: CharRange, modified: CharRange) -> Self {
        Self { original, modified }
    }
}

impl fmt::Display for RangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} -> {}}}", self.original, self.modified)
    }
}

/// A hunk: a line level change with the character changes inside it.
///
/// Inner changes end before `end_line_exclusive`, or at its column 1. They
/// start on or after `start_line`, except that a change removing or adding
/// whole lines may start at the end of the line before the hunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LineRangeMapping {
    pub original: LineRange,
    pub modified: LineRange,
    pub inner_changes: Vec<RangeMapping>,
}

impl LineRangeMapping {
    pub fn new(original: LineRange, modified: LineRange, inner_changes: Vec<RangeMapping>) -> Self {
        Self {
            original,
            modified,
            inner_changes,
        }
    }

    pub fn from_change(change: &SequenceChange) -> Self {
        Self::new(
            LineRange::from_offsets(change.original()),
            LineRange::from_offsets(change.modified()),
            Vec::new(),
        )
    }

    pub(crate) fn from_sequence_diff(diff: &SequenceDiff) -> Self {
        Self::new(
            LineRange::from_offsets(diff.seq1),
            LineRange::from_offsets(diff.seq2),
            Vec::new(),
        )
    }

    pub(crate) fn to_sequence_diff(&self) -> SequenceDiff {
        SequenceDiff::new(self.original.to_offsets(), self.modified.to_offsets())
    }

    /// Whole-line character ranges for this change.
    ///
    /// Ranges ending past the last line end at the end of the last line
    /// instead; an insertion or deletion at the very end starts at the end
    /// of the line before it, so its character range begins one line above
    /// the hunk. Returns `None` for the remaining case (an
    /// empty side at line 1 touching the end of the document), which only
    /// arises for empty documents.
    pub fn to_char_range_mapping<S: AsRef<str>>(
        &self,
        original: &[S],
        modified: &[S],
    ) -> Option<RangeMapping> {
        if is_valid_line_number(self.original.end_line_exclusive, original)
            && is_valid_line_number(self.modified.end_line_exclusive, modified)
        {
            return Some(RangeMapping::new(
                CharRange::new(self.original.start_line, 1, self.original.end_line_exclusive, 1),
                CharRange::new(self.modified.start_line, 1, self.modified.end_line_exclusive, 1),
            ));
        }

        if !self.original.is_empty() && !self.modified.is_empty() {
            return Some(RangeMapping::new(
                CharRange::from_positions(
                    Position::new(self.original.start_line, 1),
                    end_of_line(self.original.end_line_exclusive - 1, original),
                ),
                CharRange::from_positions(
                    Position::new(self.modified.start_line, 1),
                    end_of_line(self.modified.end_line_exclusive - 1, modified),
                ),
            ));
        }

        if self.original.start_line > 1 && self.modified.start_line > 1 {
            return Some(RangeMapping::new(
                CharRange::from_positions(
                    end_of_line(self.original.start_line - 1, original),
                    end_of_line(self.original.end_line_exclusive - 1, original),
                ),
                CharRange::from_positions(
                    end_of_line(self.modified.start_line - 1, modified),
                    end_of_line(self.modified.end_line_exclusive - 1, modified),
                ),
            ));
        }

        None
    }
}

impl fmt::Display for LineRangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} -> {}}}", self.original, self.modified)
    }
}

fn is_valid_line_number<S>(line: usize, lines: &[S]) -> bool {
    line >= 1 && line <= lines.len()
}

fn line_length<S: AsRef<str>>(lines: &[S], line: usize) -> usize {
    line.checked_sub(1)
        .and_then(|index| lines.get(index))
        .map_or(0, |l| l.as_ref().chars().count())
}

/// The position after the last character of `line`, clamped into the
/// document.
fn end_of_line<S: AsRef<str>>(line: usize, lines: &[S]) -> Position {
    if line < 1 {
        return Position::new(1, 1);
    }
    if line > lines.len() {
        let last = lines.len().max(1);
        return Position::new(last, line_length(lines, last) + 1);
    }
    Position::new(line, line_length(lines, line) + 1)
}

/// The smallest line mapping covering a character mapping.
///
/// A change ending at column 1 does not touch its end line, and a change
/// starting at the end of a line does not touch its start line, as long as
/// dropping the line leaves the range well formed.
pub fn line_range_mapping_for<S: AsRef<str>>(
    mapping: &RangeMapping,
    original: &[S],
    modified: &[S],
) -> LineRangeMapping {
    let o = &mapping.original;
    let m = &mapping.modified;

    let mut end_delta = 0;
    if m.end_column == 1
        && o.end_column == 1
        && o.start_line <= o.end_line
        && m.start_line <= m.end_line
    {
        end_delta = 1;
    }

    let mut start_delta = 0;
    if m.start_column > line_length(modified, m.start_line)
        && o.start_column > line_length(original, o.start_line)
        && o.start_line + end_delta <= o.end_line
        && m.start_line + end_delta <= m.end_line
    {
        start_delta = 1;
    }

    LineRangeMapping::new(
        LineRange::new(o.start_line + start_delta, o.end_line + 1 - end_delta),
        LineRange::new(m.start_line + start_delta, m.end_line + 1 - end_delta),
        vec![*mapping],
    )
}

/// Groups character mappings into hunks.
///
/// Consecutive mappings whose covering line ranges overlap or touch on
/// either side end up in the same [`LineRangeMapping`].
pub fn line_range_mappings_from_range_mappings<S: AsRef<str>>(
    mappings: &[RangeMapping],
    original: &[S],
    modified: &[S],
) -> Vec<LineRangeMapping> {
    let mut result: Vec<LineRangeMapping> = Vec::new();
    let mut previous: Option<LineRangeMapping> = None;
    for mapping in mappings {
        let current = line_range_mapping_for(mapping, original, modified);
        match result.last_mut() {
            Some(group)
                if previous.as_ref().is_some_and(|p| {
                    p.original.overlaps_or_touches(&current.original)
                        || p.modified.overlaps_or_touches(&current.modified)
                }) =>
            {
                group.original = group.original.join(&current.original);
                group.modified = group.modified.join(&current.modified);
                group.inner_changes.push(*mapping);
            }
            _ => result.push(current.clone()),
        }
        previous = Some(current);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn line_range_basics() {
        let range = LineRange::from_offsets(OffsetRange::new(2, 5));
        assert_eq!(range, LineRange::new(3, 6));
        assert_eq!(range.len(), 3);
        assert!(range.contains(5));
        assert!(!range.contains(6));
        assert!(range.overlaps_or_touches(&LineRange::new(6, 6)));
        assert!(!range.overlaps_or_touches(&LineRange::new(7, 8)));
        assert_eq!(range.to_string(), "[3,6)");
        assert_eq!(range.slice(&["a", "b", "c", "d"]), &["c", "d"]);
    }

    #[test]
    fn char_range_display() {
        let mapping = RangeMapping::new(CharRange::new(1, 2, 1, 4), CharRange::new(2, 1, 3, 1));
        assert_eq!(mapping.to_string(), "{[1,2 -> 1,4) -> [2,1 -> 3,1)}");
    }

    #[test]
    fn whole_line_char_ranges() {
        let original = ["a", "b", "c"];
        let modified = ["a", "x", "c"];
        let change = LineRangeMapping::new(LineRange::new(2, 3), LineRange::new(2, 3), vec![]);
        assert_eq!(
            change.to_char_range_mapping(&original, &modified),
            Some(RangeMapping::new(CharRange::new(2, 1, 3, 1), CharRange::new(2, 1, 3, 1)))
        );
    }

    #[test]
    fn char_ranges_at_end_of_file() {
        let original = ["a", "bb"];
        let modified = ["a", "bb", "ccc"];
        let insert = LineRangeMapping::new(LineRange::new(3, 3), LineRange::new(3, 4), vec![]);
        assert_eq!(
            insert.to_char_range_mapping(&original, &modified),
            Some(RangeMapping::new(CharRange::new(2, 3, 2, 3), CharRange::new(2, 3, 3, 4)))
        );
        let replace = LineRangeMapping::new(LineRange::new(2, 3), LineRange::new(2, 4), vec![]);
        assert_eq!(
            replace.to_char_range_mapping(&original, &modified),
            Some(RangeMapping::new(CharRange::new(2, 1, 2, 3), CharRange::new(2, 1, 3, 4)))
        );
        let empty: [&str; 0] = [];
        let from_nothing =
            LineRangeMapping::new(LineRange::new(1, 1), LineRange::new(1, 2), vec![]);
        assert_eq!(from_nothing.to_char_range_mapping(&empty, &["x"]), None);
    }

    #[test]
    fn covering_line_ranges() {
        let original = ["abc", "def"];
        let modified = ["abc", "xyz", "def"];
        // an inserted line, seen as "\nxyz" after the end of line 1
        let insert = RangeMapping::new(CharRange::new(1, 4, 1, 4), CharRange::new(1, 4, 2, 4));
        let line = line_range_mapping_for(&insert, &original, &modified);
        assert_eq!(line.original, LineRange::new(2, 2));
        assert_eq!(line.modified, LineRange::new(2, 3));

        // a word change inside line 1
        let word = RangeMapping::new(CharRange::new(1, 2, 1, 3), CharRange::new(1, 2, 1, 3));
        let line = line_range_mapping_for(&word, &original, &modified);
        assert_eq!(line.original, LineRange::new(1, 2));
    }

    #[test]
    fn touching_mappings_are_grouped() {
        let original = ["aaa", "bbb", "ccc", "ddd", "eee"];
        let modified = ["aXa", "bXb", "ccc", "ddd", "eXe"];
        let mappings = [
            RangeMapping::new(CharRange::new(1, 2, 1, 3), CharRange::new(1, 2, 1, 3)),
            RangeMapping::new(CharRange::new(2, 2, 2, 3), CharRange::new(2, 2, 2, 3)),
            RangeMapping::new(CharRange::new(5, 2, 5, 3), CharRange::new(5, 2, 5, 3)),
        ];
        let hunks = line_range_mappings_from_range_mappings(&mappings, &original, &modified);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].original, LineRange::new(1, 3));
        assert_eq!(hunks[0].inner_changes.len(), 2);
        assert_eq!(hunks[1].modified, LineRange::new(5, 6));
    }
}
