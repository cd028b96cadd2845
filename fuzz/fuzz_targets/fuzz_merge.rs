#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use diffalign::utils::split_lines;
use diffalign::{compute_diff, compute_merge_fillers_and_conflicts, DiffOptions};

fuzz_target!(|x: (String, String, String)| {
    let (base, left, right) = x;
    let base = split_lines(&base);
    let left = split_lines(&left);
    let right = split_lines(&right);
    let options = DiffOptions::default();
    let diff_left = compute_diff(&base, &left, &options);
    let diff_right = compute_diff(&base, &right, &options);
    let alignment =
        compute_merge_fillers_and_conflicts(&diff_left, &diff_right, &base, &left, &right);

    let mut next = 1;
    for region in &alignment.regions {
        assert_eq!(region.base_range.start_line, next);
        next = region.base_range.end_line_exclusive;
        assert_eq!(region.is_conflict, region.left_changed && region.right_changed);
    }
    assert_eq!(next, base.len() + 1);

    let merged = alignment.apply_non_conflicting(&base, &left, &right);
    assert_eq!(merged.conflicts.is_empty(), !alignment.has_conflicts());
    if diff_right.is_identical() {
        assert_eq!(merged.lines, left);
    }
});
