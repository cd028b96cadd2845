// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! Three-way merge alignment.
//!
//! Two diffs against the same base are laid over each other. Changes from
//! either side whose base ranges overlap or touch form one region; the
//! stretches in between are unchanged regions, so the regions partition the
//! base. A region changed on both sides is a conflict. Fillers pad the
//! shorter side of each region so the three versions can be shown side by
//! side, line for line.

use tracing::{debug, instrument, trace};

use crate::lines_diff::LinesDiff;
use crate::mapping::{LineRange, LineRangeMapping};

/// One stretch of the base and what each side made of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MergeRegion {
    pub base_range: LineRange,
    pub left_output_range: LineRange,
    pub right_output_range: LineRange,
    pub left_changed: bool,
    pub right_changed: bool,
    pub is_conflict: bool,
}

impl MergeRegion {
    pub fn is_changed(&self) -> bool {
        self.left_changed || self.right_changed
    }
}

/// `count` blank lines to show after line `after_line` of one side; `0`
/// means before the first line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Filler {
    pub after_line: usize,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeFillers {
    pub left_fillers: Vec<Filler>,
    pub right_fillers: Vec<Filler>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeAlignment {
    /// Ordered, and covering every base line exactly once.
    pub regions: Vec<MergeRegion>,
    pub fillers: MergeFillers,
    /// The base to left changes that take part in conflicts.
    pub conflict_left: Vec<LineRangeMapping>,
    /// The base to right changes that take part in conflicts.
    pub conflict_right: Vec<LineRangeMapping>,
    /// One of the input diffs is a best-effort result.
    pub hit_timeout: bool,
}

/// Lines of an automatic merge, with the conflicts left in base form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutput {
    pub lines: Vec<String>,
    /// Where the unresolved conflicts ended up in `lines`.
    pub conflicts: Vec<LineRange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Running state of one side while regions are built.
#[derive(Default)]
struct SideState {
    /// Output lines minus base lines for everything before the region.
    delta: isize,
    region_delta: isize,
    changed: bool,
    mappings: Vec<LineRangeMapping>,
}

impl SideState {
    fn add(&mut self, change: &LineRangeMapping) {
        self.region_delta += change.modified.len() as isize - change.original.len() as isize;
        self.changed = true;
        self.mappings.push(change.clone());
    }

    /// Output range of `base_range`, then resets for the next region.
    fn close(&mut self, base_range: LineRange) -> LineRange {
        let start = base_range.start_line.saturating_add_signed(self.delta);
        let end = base_range
            .end_line_exclusive
            .saturating_add_signed(self.delta + self.region_delta);
        self.delta += self.region_delta;
        self.region_delta = 0;
        self.changed = false;
        LineRange::new(start, end)
    }
}

fn assert_within<S>(diff: &LinesDiff, base: &[S], output: &[S], side: &str) {
    for change in &diff.changes {
        assert!(
            change.original.end_line_exclusive <= base.len() + 1,
            "{side} change {change} exceeds the {} base lines",
            base.len()
        );
        assert!(
            change.modified.end_line_exclusive <= output.len() + 1,
            "{side} change {change} exceeds the {} {side} lines",
            output.len()
        );
    }
}

/// Aligns two diffs against the same base into regions, fillers and
/// conflicts.
///
/// # Panics
///
/// If a change references lines beyond `base`, `left` or `right`.
#[instrument(skip_all)]
pub fn compute_merge_fillers_and_conflicts<S: AsRef<str>>(
    diff_base_left: &LinesDiff,
    diff_base_right: &LinesDiff,
    base: &[S],
    left: &[S],
    right: &[S],
) -> MergeAlignment {
    assert_within(diff_base_left, base, left, "left");
    assert_within(diff_base_right, base, right, "right");

    let mut changes: Vec<(Side, &LineRangeMapping)> = diff_base_left
        .changes
        .iter()
        .map(|c| (Side::Left, c))
        .chain(diff_base_right.changes.iter().map(|c| (Side::Right, c)))
        .collect();
    changes.sort_by_key(|(_, c)| (c.original.start_line, c.original.end_line_exclusive));

    let mut alignment = MergeAlignment {
        hit_timeout: diff_base_left.hit_timeout || diff_base_right.hit_timeout,
        ..MergeAlignment::default()
    };
    let mut left_state = SideState::default();
    let mut right_state = SideState::default();
    let mut next_base_line = 1;

    let mut changes = changes.into_iter().peekable();
    while let Some((side, first)) = changes.next() {
        if next_base_line < first.original.start_line {
            let gap = LineRange::new(next_base_line, first.original.start_line);
            push_region(&mut alignment, gap, &mut left_state, &mut right_state);
        }

        let mut base_range = first.original;
        let mut add = |side: Side, change: &LineRangeMapping| match side {
            Side::Left => left_state.add(change),
            Side::Right => right_state.add(change),
        };
        add(side, first);
        while let Some((side, next)) =
            changes.next_if(|(_, c)| c.original.start_line <= base_range.end_line_exclusive)
        {
            base_range = base_range.join(&next.original);
            add(side, next);
        }

        push_region(&mut alignment, base_range, &mut left_state, &mut right_state);
        next_base_line = next_base_line.max(base_range.end_line_exclusive);
    }
    let end = base.len() + 1;
    if next_base_line < end {
        let gap = LineRange::new(next_base_line, end);
        push_region(&mut alignment, gap, &mut left_state, &mut right_state);
    }

    debug!(
        regions = alignment.regions.len(),
        conflicts = alignment.regions.iter().filter(|r| r.is_conflict).count(),
        "merge aligned"
    );
    alignment
}

fn push_region(
    alignment: &mut MergeAlignment,
    base_range: LineRange,
    left: &mut SideState,
    right: &mut SideState,
) {
    let (left_changed, right_changed) = (left.changed, right.changed);
    let is_conflict = left_changed && right_changed;
    let left_output_range = left.close(base_range);
    let right_output_range = right.close(base_range);

    let left_mappings = std::mem::take(&mut left.mappings);
    let right_mappings = std::mem::take(&mut right.mappings);
    if is_conflict {
        alignment.conflict_left.extend(left_mappings);
        alignment.conflict_right.extend(right_mappings);
    }

    let (left_len, right_len) = (left_output_range.len(), right_output_range.len());
    if left_len < right_len {
        alignment.fillers.left_fillers.push(Filler {
            after_line: left_output_range.end_line_exclusive - 1,
            count: right_len - left_len,
        });
    } else if right_len < left_len {
        alignment.fillers.right_fillers.push(Filler {
            after_line: right_output_range.end_line_exclusive - 1,
            count: left_len - right_len,
        });
    }

    let region = MergeRegion {
        base_range,
        left_output_range,
        right_output_range,
        left_changed,
        right_changed,
        is_conflict,
    };
    trace!(?region, "region");
    alignment.regions.push(region);
}

impl MergeAlignment {
    pub fn has_conflicts(&self) -> bool {
        self.regions.iter().any(|r| r.is_conflict)
    }

    /// Takes every single-side change and leaves conflicts as base text.
    pub fn apply_non_conflicting<S: AsRef<str>>(
        &self,
        base: &[S],
        left: &[S],
        right: &[S],
    ) -> MergeOutput {
        let mut output = MergeOutput::default();
        for region in &self.regions {
            let lines = if region.is_conflict || !region.is_changed() {
                region.base_range.slice(base)
            } else if region.left_changed {
                region.left_output_range.slice(left)
            } else {
                region.right_output_range.slice(right)
            };
            let start = output.lines.len() + 1;
            output
                .lines
                .extend(lines.iter().map(|l| l.as_ref().to_string()));
            if region.is_conflict {
                output
                    .conflicts
                    .push(LineRange::new(start, output.lines.len() + 1));
            }
        }
        output
    }
}
