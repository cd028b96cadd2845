// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{exit, ExitCode};

use tracing::{debug, error};

use crate::lines_diff::compute_diff;
use crate::merge::compute_merge_fillers_and_conflicts;
use crate::params::{parse_params, usage, Mode, Params};
use crate::render::{write_diff, write_merge};
use crate::utils::{read_input, report_failure_to_read_input_file, split_lines};

const TROUBLE: u8 = 2;

/// Reads every input, reporting each one that fails.
fn read_inputs(params: &Params) -> Option<Vec<String>> {
    let mut io_error = false;
    let contents: Vec<String> = params
        .inputs
        .iter()
        .map(|path| {
            read_input(path).unwrap_or_else(|e| {
                report_failure_to_read_input_file(&params.executable, path, &e);
                io_error = true;
                String::new()
            })
        })
        .collect();
    (!io_error).then_some(contents)
}

fn is_same_input(a: &OsString, b: &OsString) -> bool {
    a == "-" && b == "-" || same_file::is_same_file(a, b).unwrap_or(false)
}

fn flush_output(result: io::Result<()>) -> Result<(), ExitCode> {
    result
        .and_then(|()| io::stdout().flush())
        .map_err(|e| {
            error!(error = %e, "writing output failed");
            eprintln!("diffalign: {e}");
            ExitCode::from(TROUBLE)
        })
}

fn run_diff(params: &Params) -> ExitCode {
    let (from, to) = (&params.inputs[0], &params.inputs[1]);
    if is_same_input(from, to) {
        debug!("inputs are the same file");
        return ExitCode::SUCCESS;
    }
    let Some(contents) = read_inputs(params) else {
        return ExitCode::from(TROUBLE);
    };
    let original = split_lines(&contents[0]);
    let modified = split_lines(&contents[1]);

    let diff = compute_diff(&original, &modified, &params.options);
    if diff.is_identical() {
        return ExitCode::SUCCESS;
    }
    if params.brief {
        println!(
            "Files {} and {} differ",
            from.to_string_lossy(),
            to.to_string_lossy()
        );
    } else if let Err(code) = flush_output(write_diff(
        &mut io::stdout().lock(),
        &diff,
        &original,
        &modified,
    )) {
        return code;
    }
    ExitCode::from(1)
}

fn run_merge(params: &Params) -> ExitCode {
    let Some(contents) = read_inputs(params) else {
        return ExitCode::from(TROUBLE);
    };
    let base = split_lines(&contents[0]);
    let left = split_lines(&contents[1]);
    let right = split_lines(&contents[2]);

    let diff_left = compute_diff(&base, &left, &params.options);
    let diff_right = compute_diff(&base, &right, &params.options);
    let alignment =
        compute_merge_fillers_and_conflicts(&diff_left, &diff_right, &base, &left, &right);

    let has_conflicts = alignment.has_conflicts();
    if params.brief {
        if has_conflicts {
            println!(
                "Files {} and {} conflict",
                params.inputs[1].to_string_lossy(),
                params.inputs[2].to_string_lossy()
            );
        }
    } else if let Err(code) = flush_output(write_merge(
        &mut io::stdout().lock(),
        &alignment,
        &base,
        &left,
        &right,
    )) {
        return code;
    }
    if has_conflicts {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

// Exit codes follow diff(1): 0 means no differences (or no conflicts when
// merging), 1 means some were found and 2 means trouble.
pub fn main<I: IntoIterator<Item = OsString>>(opts: I) -> ExitCode {
    let params = parse_params(opts).unwrap_or_else(|error| {
        eprintln!("{error}");
        exit(TROUBLE.into());
    });
    if params.help {
        println!("{}", usage(&params.executable));
        println!();
        println!("  -w, --ignore-trim-whitespace  ignore leading and trailing whitespace");
        println!("      --max-time=MS             time budget in milliseconds, 0 or less for none");
        println!("      --moves                   detect moved blocks of lines");
        println!("      --subwords                extend changes to camel case subwords");
        println!("  -m, --merge                   align LEFT and RIGHT against BASE");
        println!("  -q, --brief                   only report whether there are differences");
        println!("  -h, --help                    show this help");
        println!("  -v, --version                 show the version");
        return ExitCode::SUCCESS;
    }
    if params.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    debug!(?params, "parsed arguments");

    match params.mode {
        Mode::Diff => run_diff(&params),
        Mode::Merge => run_merge(&params),
    }
}
