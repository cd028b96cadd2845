// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

//! Plain text reports of diffs and merge alignments.

use std::io::{self, Write};

use crate::lines_diff::LinesDiff;
use crate::mapping::LineRangeMapping;
use crate::merge::{Filler, MergeAlignment};

const TIMEOUT_NOTE: &str = "# time budget exceeded, result may not be minimal";

fn write_lines<S: AsRef<str>>(
    output: &mut impl Write,
    prefix: &str,
    lines: &[S],
) -> io::Result<()> {
    for line in lines {
        writeln!(output, "{prefix}{}", line.as_ref())?;
    }
    Ok(())
}

fn write_change<S: AsRef<str>>(
    output: &mut impl Write,
    change: &LineRangeMapping,
    original: &[S],
    modified: &[S],
) -> io::Result<()> {
    writeln!(output, "@@ {} -> {} @@", change.original, change.modified)?;
    write_lines(output, "-", change.original.slice(original))?;
    write_lines(output, "+", change.modified.slice(modified))?;
    for inner in &change.inner_changes {
        writeln!(output, "  ~ {inner}")?;
    }
    Ok(())
}

/// Writes every change with the lines it removes and adds, followed by the
/// moved blocks.
pub fn write_diff<S: AsRef<str>>(
    output: &mut impl Write,
    diff: &LinesDiff,
    original: &[S],
    modified: &[S],
) -> io::Result<()> {
    for change in &diff.changes {
        write_change(output, change, original, modified)?;
    }
    for moved in &diff.moves {
        let mapping = &moved.line_range_mapping;
        writeln!(output, "moved {} -> {}", mapping.original, mapping.modified)?;
        for change in &moved.changes {
            writeln!(output, "  changed {change}")?;
        }
    }
    if diff.hit_timeout {
        writeln!(output, "{TIMEOUT_NOTE}")?;
    }
    Ok(())
}

fn write_fillers(output: &mut impl Write, side: &str, fillers: &[Filler]) -> io::Result<()> {
    for filler in fillers {
        writeln!(
            output,
            "filler {side} after line {}: {}",
            filler.after_line, filler.count
        )?;
    }
    Ok(())
}

/// Writes the changed regions of a merge, conflicts with all three versions
/// between markers, then the fillers.
pub fn write_merge<S: AsRef<str>>(
    output: &mut impl Write,
    alignment: &MergeAlignment,
    base: &[S],
    left: &[S],
    right: &[S],
) -> io::Result<()> {
    for region in alignment.regions.iter().filter(|r| r.is_changed()) {
        let (base_range, left_range, right_range) = (
            region.base_range,
            region.left_output_range,
            region.right_output_range,
        );
        if region.is_conflict {
            writeln!(
                output,
                "conflict: base {base_range} left {left_range} right {right_range}"
            )?;
            writeln!(output, "<<<<<<< left")?;
            write_lines(output, "", left_range.slice(left))?;
            writeln!(output, "||||||| base")?;
            write_lines(output, "", base_range.slice(base))?;
            writeln!(output, "=======")?;
            write_lines(output, "", right_range.slice(right))?;
            writeln!(output, ">>>>>>> right")?;
        } else if region.left_changed {
            writeln!(output, "left: base {base_range} -> {left_range}")?;
            write_lines(output, "-", base_range.slice(base))?;
            write_lines(output, "+", left_range.slice(left))?;
        } else {
            writeln!(output, "right: base {base_range} -> {right_range}")?;
            write_lines(output, "-", base_range.slice(base))?;
            write_lines(output, "+", right_range.slice(right))?;
        }
    }
    write_fillers(output, "left", &alignment.fillers.left_fillers)?;
    write_fillers(output, "right", &alignment.fillers.right_fillers)?;
    if alignment.hit_timeout {
        writeln!(output, "{TIMEOUT_NOTE}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines_diff::{compute_diff, DiffOptions};
    use crate::merge::compute_merge_fillers_and_conflicts;
    use pretty_assertions::assert_eq;

    fn render_diff(original: &[&str], modified: &[&str], options: &DiffOptions) -> String {
        let diff = compute_diff(original, modified, options);
        let mut output = Vec::new();
        write_diff(&mut output, &diff, original, modified).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn render_merge(base: &[&str], left: &[&str], right: &[&str]) -> String {
        let options = DiffOptions::default();
        let alignment = compute_merge_fillers_and_conflicts(
            &compute_diff(base, left, &options),
            &compute_diff(base, right, &options),
            base,
            left,
            right,
        );
        let mut output = Vec::new();
        write_merge(&mut output, &alignment, base, left, right).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn identical_renders_nothing() {
        assert_eq!(render_diff(&["a"], &["a"], &DiffOptions::default()), "");
    }

    #[test]
    fn changed_line() {
        assert_eq!(
            render_diff(&["a", "x = 1", "b"], &["a", "x = 2", "b"], &DiffOptions::default()),
            "@@ [2,3) -> [2,3) @@\n\
             -x = 1\n\
             +x = 2\n  \
             ~ {[2,5 -> 2,6) -> [2,5 -> 2,6)}\n"
        );
    }

    #[test]
    fn moves_are_listed() {
        let options = DiffOptions {
            compute_moves: true,
            ..DiffOptions::default()
        };
        let output = render_diff(
            &["alpha beta", "gamma delta", "epsilon zeta", "x", "y", "z"],
            &["x", "y", "z", "alpha beta", "gamma delta", "epsilon zeta"],
            &options,
        );
        assert_eq!(output.lines().filter(|l| l.starts_with("moved ")).count(), 1);
    }

    #[test]
    fn single_side_merge() {
        assert_eq!(
            render_merge(&["a", "b"], &["a", "b"], &["a", "c"]),
            "right: base [2,3) -> [2,3)\n-b\n+c\n"
        );
    }

    #[test]
    fn conflict_shows_all_versions() {
        let output = render_merge(&["a", "b", "c"], &["a", "L", "c"], &["a", "R", "R2", "c"]);
        assert_eq!(
            output,
            "conflict: base [2,3) left [2,3) right [2,4)\n\
             <<<<<<< left\n\
             L\n\
             ||||||| base\n\
             b\n\
             =======\n\
             R\n\
             R2\n\
             >>>>>>> right\n\
             filler left after line 2: 1\n"
        );
    }
}
