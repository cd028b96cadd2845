#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use diffalign::utils::split_lines;
use diffalign::{compute_diff, LineRange, DiffOptions};

fuzz_target!(|x: (String, String, bool, bool, bool)| {
    let (original, modified, ignore_trim_whitespace, compute_moves, extend_to_subwords) = x;
    let original = split_lines(&original);
    let modified = split_lines(&modified);
    let options = DiffOptions {
        ignore_trim_whitespace,
        compute_moves,
        extend_to_subwords,
        ..DiffOptions::default()
    };
    let diff = compute_diff(&original, &modified, &options);

    // Replaying the changes must give back the modified lines, up to
    // whitespace when it is ignored.
    let mut rebuilt: Vec<&str> = Vec::new();
    let mut next = 1;
    for change in &diff.changes {
        assert!(change.original.start_line >= next);
        rebuilt.extend(LineRange::new(next, change.original.start_line).slice(&original));
        rebuilt.extend(change.modified.slice(&modified));
        next = change.original.end_line_exclusive;
    }
    rebuilt.extend(LineRange::new(next, original.len() + 1).slice(&original));
    if ignore_trim_whitespace {
        let trimmed: Vec<&str> = rebuilt.iter().map(|l| l.trim()).collect();
        let expected: Vec<&str> = modified.iter().map(|l| l.trim()).collect();
        assert_eq!(trimmed, expected);
    } else {
        assert_eq!(rebuilt, modified);
    }
});
