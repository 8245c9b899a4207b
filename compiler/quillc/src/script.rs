//! Edit scripts for `quill replay`.
//!
//! One edit per line:
//!
//! ```text
//! +<index> <text>   insert text before codepoint index
//! -<lo> <hi>        remove codepoints lo..hi
//! ```
//!
//! Inserted text may use `\n`, `\t` and `\\`. Blank lines and lines starting
//! with `#` are skipped.

use std::fmt;

use crate::CliError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Insert { at: usize, text: String },
    Remove { lo: usize, hi: usize },
}

impl Step {
    /// The step as a `(lo, hi, text)` buffer edit.
    pub fn as_edit(&self) -> (usize, usize, &str) {
        match self {
            Step::Insert { at, text } => (*at, *at, text),
            Step::Remove { lo, hi } => (*lo, *hi, ""),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Insert { at, text } => write!(f, "+{at} {text:?}"),
            Step::Remove { lo, hi } => write!(f, "-{lo} {hi}"),
        }
    }
}

pub fn parse_script(source: &str) -> Result<Vec<Step>, CliError> {
    let mut steps = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let fail = |message: String| CliError::Script {
            line: line_number,
            message,
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('+') {
            let (at, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let at = number(at).map_err(fail)?;
            let text = unescape(text).map_err(fail)?;
            steps.push(Step::Insert { at, text });
        } else if let Some(rest) = line.strip_prefix('-') {
            let mut fields = rest.split_whitespace();
            let (Some(lo), Some(hi), None) = (fields.next(), fields.next(), fields.next()) else {
                return Err(fail("expected -<lo> <hi>".to_owned()));
            };
            let lo = number(lo).map_err(fail)?;
            let hi = number(hi).map_err(fail)?;
            if hi < lo {
                return Err(fail(format!("range {lo}..{hi} is backwards")));
            }
            steps.push(Step::Remove { lo, hi });
        } else {
            return Err(fail("expected a line starting with + or -".to_owned()));
        }
    }
    Ok(steps)
}

fn number(field: &str) -> Result<usize, String> {
    field
        .parse()
        .map_err(|_| format!("'{field}' is not a codepoint index"))
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("trailing backslash".to_owned()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests;
