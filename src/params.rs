// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::{OsStr, OsString};

use regex::Regex;

use crate::lines_diff::DiffOptions;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Two-way diff of ORIGINAL and MODIFIED.
    #[default]
    Diff,
    /// Three-way alignment of LEFT and RIGHT against BASE.
    Merge,
}

#[cfg(unix)]
fn osstr_bytes(osstr: &OsStr) -> &[u8] {
    use std::os::unix::ffi::OsStrExt;
    osstr.as_bytes()
}

#[cfg(not(unix))]
fn osstr_bytes(osstr: &OsStr) -> Vec<u8> {
    osstr.to_string_lossy().bytes().collect()
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params {
    pub executable: OsString,
    /// ORIGINAL and MODIFIED, or BASE, LEFT and RIGHT.
    pub inputs: Vec<OsString>,
    pub mode: Mode,
    pub options: DiffOptions,
    pub brief: bool,
    pub help: bool,
    pub version: bool,
}

impl Params {
    fn expected_inputs(&self) -> usize {
        match self.mode {
            Mode::Diff => 2,
            Mode::Merge => 3,
        }
    }
}

pub fn usage(executable: &OsStr) -> String {
    let exe = executable.to_string_lossy();
    format!(
        "Usage: {exe} [OPTIONS] ORIGINAL MODIFIED\n       \
         {exe} --merge [OPTIONS] BASE LEFT RIGHT"
    )
}

pub fn parse_params<I: IntoIterator<Item = OsString>>(opts: I) -> Result<Params, String> {
    let mut opts = opts.into_iter();

    let Some(executable) = opts.next() else {
        return Err("Usage: <exe> ORIGINAL MODIFIED".to_string());
    };
    let mut params = Params {
        executable,
        ..Params::default()
    };
    let max_time_re = Regex::new(r"^--max-time=(?<num>-?\d+)$").map_err(|e| e.to_string())?;

    while let Some(param) = opts.next() {
        if param == "--" {
            params.inputs.extend(opts.by_ref());
            break;
        }
        if param == "-" {
            params.inputs.push(param);
            continue;
        }
        if param == "--ignore-trim-whitespace" {
            params.options.ignore_trim_whitespace = true;
            continue;
        }
        if param == "--moves" {
            params.options.compute_moves = true;
            continue;
        }
        if param == "--subwords" {
            params.options.extend_to_subwords = true;
            continue;
        }
        if param == "--merge" {
            params.mode = Mode::Merge;
            continue;
        }
        if param == "--brief" {
            params.brief = true;
            continue;
        }
        if param == "--help" {
            params.help = true;
            continue;
        }
        if param == "--version" {
            params.version = true;
            continue;
        }
        if let Some(captures) = max_time_re.captures(param.to_string_lossy().as_ref()) {
            let num = captures.name("num").map_or("", |m| m.as_str());
            let max_ms = num
                .parse::<i64>()
                .map_err(|_| format!("invalid time budget «{num}»"))?;
            params.options = params.options.with_max_computation_time_ms(max_ms);
            continue;
        }
        let p = osstr_bytes(&param);
        if p.first() == Some(&b'-') && p.get(1) != Some(&b'-') {
            for b in p[1..].iter().copied() {
                match b {
                    b'w' => params.options.ignore_trim_whitespace = true,
                    b'm' => params.mode = Mode::Merge,
                    b'q' => params.brief = true,
                    b'h' => params.help = true,
                    b'v' => params.version = true,
                    _ => {
                        return Err(format!(
                            "Unknown option: {}\n{}",
                            String::from_utf8_lossy(&[b]),
                            usage(&params.executable)
                        ))
                    }
                }
            }
        } else if p.starts_with(b"--") {
            return Err(format!(
                "Unknown option: {}\n{}",
                param.to_string_lossy(),
                usage(&params.executable)
            ));
        } else {
            params.inputs.push(param);
        }
    }

    if params.help || params.version {
        return Ok(params);
    }
    if params.inputs.len() != params.expected_inputs() {
        return Err(usage(&params.executable));
    }
    Ok(params)
}
