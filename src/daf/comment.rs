//! Comment-area symbol extraction.
//!
//! SPK producers record provenance in the DAF comment area: the ephemeris
//! version, the constants the integration used (`AU`, `EMRAT`, body GMs),
//! coverage notes. Two assignment styles occur in the wild:
//!
//! ```text
//! AU      = 0.1495978707000000E+09
//! EMRAT    81.30056789872074
//! ```
//!
//! This module parses both heuristically — `KEY = value[s]` and
//! `KEY value1 value2 ...` — without attempting full kernel-pool semantics.
//! Fortran `D` exponents are normalized before numeric parsing, and later
//! assignments of the same key shadow earlier ones.

use std::io::{Read, Seek};
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;

use crate::daf::DafFile;
use crate::orrery_errors::OrreryError;

static ASSIGNMENT_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9_]+)\s*=\s*(.+)$").expect("valid regex"));

static ASSIGNMENT_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9_]+)\s+([-+]?\d+(?:\.\d*)?(?:[DEde][+-]?\d+)?)(?:\s+(.+))?$")
        .expect("valid regex")
});

/// One parsed comment-area assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct DafSymbol {
    pub name: String,
    /// Right-hand-side tokens as written.
    pub raw_values: Vec<String>,
    /// The tokens that parsed as numbers, in order.
    pub numeric_values: Vec<f64>,
}

impl DafSymbol {
    /// First numeric value, the common case for scalar constants.
    pub fn first_numeric(&self) -> Option<f64> {
        self.numeric_values.first().copied()
    }
}

impl std::fmt::Display for DafSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name, self.raw_values.join(" "))
    }
}

/// Parse assignment-style symbols out of comment lines.
///
/// Both `KEY = values` and columnar `KEY value1 value2...` lines are
/// accepted; columnar lines require a leading numeric value so prose lines
/// are not misread as assignments.
pub fn parse_symbols(lines: &[String]) -> Vec<DafSymbol> {
    let mut symbols = Vec::new();
    for raw_line in lines {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = ASSIGNMENT_EQUALS.captures(line) {
            let name = captures[1].to_string();
            let raw_values = tokenize(&captures[2]);
            if raw_values.is_empty() {
                continue;
            }
            let numeric_values = parse_numeric_tokens(&raw_values);
            symbols.push(DafSymbol {
                name,
                raw_values,
                numeric_values,
            });
        } else if let Some(captures) = ASSIGNMENT_COLUMNS.captures(line) {
            let name = captures[1].to_string();
            let mut rhs = captures[2].to_string();
            if let Some(rest) = captures.get(3) {
                rhs.push(' ');
                rhs.push_str(rest.as_str().trim());
            }
            let raw_values = tokenize(&rhs);
            let numeric_values = parse_numeric_tokens(&raw_values);
            if !numeric_values.is_empty() {
                symbols.push(DafSymbol {
                    name,
                    raw_values,
                    numeric_values,
                });
            }
        }
    }
    symbols
}

/// Find a symbol by name, honoring last-assignment-wins shadowing.
pub fn find_symbol<'a>(symbols: &'a [DafSymbol], name: &str) -> Option<&'a DafSymbol> {
    symbols
        .iter()
        .rev()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Read the comment area of a DAF kernel and parse its symbols.
pub fn extract_comments(path: &Utf8Path) -> Result<(Vec<String>, Vec<DafSymbol>), OrreryError> {
    let mut daf = DafFile::open(path)?;
    extract_comments_from(&mut daf)
}

/// As [`extract_comments`], over an already-open container.
pub fn extract_comments_from<R: Read + Seek>(
    daf: &mut DafFile<R>,
) -> Result<(Vec<String>, Vec<DafSymbol>), OrreryError> {
    let lines = daf.comment_lines()?;
    let symbols = parse_symbols(&lines);
    Ok((lines, symbols))
}

/// Look up a scalar constant (first numeric of the named symbol) in a
/// kernel's comment area.
pub fn try_get_constant(path: &Utf8Path, name: &str) -> Result<Option<f64>, OrreryError> {
    let (_, symbols) = extract_comments(path)?;
    Ok(find_symbol(&symbols, name).and_then(DafSymbol::first_numeric))
}

fn tokenize(rhs: &str) -> Vec<String> {
    rhs.replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_numeric_tokens(raw_tokens: &[String]) -> Vec<f64> {
    raw_tokens
        .iter()
        .filter_map(|token| {
            let normalized = if token.contains(['D', 'd']) {
                token.replace(['d', 'D'], "E")
            } else {
                token.clone()
            };
            normalized.parse::<f64>().ok()
        })
        .collect()
}
