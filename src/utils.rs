// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};

use regex::Regex;

/// Reads a whole input, `-` being standard input.
pub fn read_input(filepath: &OsString) -> io::Result<String> {
    let bytes = if filepath == "-" {
        let mut content = Vec::new();
        io::stdin().read_to_end(&mut content)?;
        content
    } else {
        fs::read(filepath)?
    };
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Splits text into lines without their terminators.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. A final terminator does not
/// start another line, so `"a\n"` is one line and `""` is none.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn read_error_message(executable: &OsString, filepath: &OsString, error: &io::Error) -> String {
    // io::Error displays as "{detail} (os error {code})", keep the detail
    let detail = error.to_string();
    let detail = match Regex::new(r"\ \(os\ error\ \d+\)$") {
        Ok(re) => re.replace(&detail, "").into_owned(),
        Err(_) => detail,
    };
    format!(
        "{}: {}: {}",
        executable.to_string_lossy(),
        filepath.to_string_lossy(),
        detail,
    )
}

pub fn report_failure_to_read_input_file(
    executable: &OsString,
    filepath: &OsString,
    error: &io::Error,
) {
    eprintln!("{}", read_error_message(executable, filepath, error));
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lines {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn terminators() {
            assert_eq!(split_lines(""), Vec::<&str>::new());
            assert_eq!(split_lines("a"), vec!["a"]);
            assert_eq!(split_lines("a\n"), vec!["a"]);
            assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
            assert_eq!(split_lines("a\r\nb\rc\n"), vec!["a", "b", "c"]);
            assert_eq!(split_lines("\n"), vec![""]);
        }

        #[test]
        fn multibyte_text() {
            assert_eq!(split_lines("épée\n😉"), vec!["épée", "😉"]);
        }
    }

    mod read {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::io::Write;
        use tempfile::NamedTempFile;

        #[test]
        fn file_contents() {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(b"one\ntwo\n").unwrap();
            let path = OsString::from(file.path());
            assert_eq!(read_input(&path).unwrap(), "one\ntwo\n");
        }

        #[test]
        fn invalid_utf8_is_replaced() {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(&[b'a', 0xff, b'\n']).unwrap();
            let path = OsString::from(file.path());
            assert_eq!(read_input(&path).unwrap(), "a\u{fffd}\n");
        }

        #[test]
        fn error_message_drops_os_code() {
            let error = io::Error::from_raw_os_error(2);
            let message = read_error_message(
                &OsString::from("diffalign"),
                &OsString::from("missing.txt"),
                &error,
            );
            assert!(message.starts_with("diffalign: missing.txt: "));
            assert!(!message.contains("os error"));
        }
    }
}
