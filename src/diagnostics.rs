//! Line-oriented syntax heuristics for Dana source text.
//!
//! These checks are intentionally not a parser: each line is validated on
//! its own (bracket state never crosses a line boundary) and the heuristics
//! keep their known false positives, which client-side tooling has come to
//! rely on. Four checks run per line, in a fixed order: bracket matching,
//! assignment-operator misuse, unknown-token spell check, and declaration
//! syntax.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::distance::edit_distance;
use crate::lexicon::Lexicon;

/// Source tag attached to every diagnostic this engine produces.
pub const DIAGNOSTIC_SOURCE: &str = "dana-language-server";

/// Short or generic identifiers that never trigger the spell check.
const COMMON_IDENTIFIERS: &[&str] = &[
    "i", "j", "k", "x", "y", "z", "n", "len", "size", "count", "temp", "result",
];

static ASSIGNMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\w+)\s*=\s*([^=<>])").expect("assignment pattern compiles"));

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("identifier pattern compiles"));

/// Per-document validation settings from the `danaLanguageServer`
/// configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationSettings {
    pub max_number_of_problems: u32,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        ValidationSettings {
            max_number_of_problems: 1000,
        }
    }
}

/// Validates `text` line by line and returns the collected diagnostics.
///
/// Lines that are blank after trimming, or that start with `#` or `(*`, are
/// skipped. The problem cap is tested at line granularity: once the running
/// count has reached `max_number_of_problems` no further line is processed,
/// so a cap of zero always yields an empty list while a line that pushes the
/// count past the cap still reports everything it found.
pub fn validate(text: &str, settings: &ValidationSettings, lexicon: &Lexicon) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let max_problems = settings.max_number_of_problems as usize;

    for (line_number, line) in text.lines().enumerate() {
        if diagnostics.len() >= max_problems {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("(*") {
            continue;
        }

        let line_number = line_number as u32;
        check_bracket_matching(line, line_number, &mut diagnostics);
        check_assignment_operators(line, line_number, &mut diagnostics);
        check_unknown_tokens(line, line_number, lexicon, &mut diagnostics);
        check_declaration_syntax(line, line_number, &mut diagnostics);
    }

    diagnostics
}

/// Column of `byte_index` in `line`, counted in characters.
fn character_column(line: &str, byte_index: usize) -> u32 {
    line[..byte_index].chars().count() as u32
}

fn line_width(line: &str) -> u32 {
    line.chars().count() as u32
}

fn single_line_range(line_number: u32, start: u32, end: u32) -> Range {
    Range {
        start: Position {
            line: line_number,
            character: start,
        },
        end: Position {
            line: line_number,
            character: end,
        },
    }
}

/// Flags closing brackets with no matching opener and openers left
/// unclosed at the end of the line. A mismatched closer consumes the
/// popped opener, so one bad pair cannot also count as unclosed.
fn check_bracket_matching(line: &str, line_number: u32, diagnostics: &mut Vec<Diagnostic>) {
    let mut stack: Vec<char> = Vec::new();

    for (column, character) in line.chars().enumerate() {
        match character {
            '(' | '[' | '{' => stack.push(character),
            ')' | ']' | '}' => {
                let closes_top = matches!(
                    (stack.pop(), character),
                    (Some('('), ')') | (Some('['), ']') | (Some('{'), '}')
                );
                if !closes_top {
                    diagnostics.push(Diagnostic {
                        range: single_line_range(line_number, column as u32, column as u32 + 1),
                        severity: Some(DiagnosticSeverity::ERROR),
                        message: format!("Unmatched closing bracket '{}'", character),
                        source: Some(DIAGNOSTIC_SOURCE.to_string()),
                        ..Default::default()
                    });
                }
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        let still_open = stack
            .iter()
            .map(|bracket| bracket.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.push(Diagnostic {
            range: single_line_range(line_number, 0, line_width(line)),
            severity: Some(DiagnosticSeverity::ERROR),
            message: format!("Unclosed bracket(s): {}", still_open),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            ..Default::default()
        });
    }
}

/// Warns on a bare `=` after an identifier, which in Dana is almost always
/// a mistyped `:=`. Comparison operators (`==`, `!=`, `<=`, `>=`) are left
/// alone.
fn check_assignment_operators(line: &str, line_number: u32, diagnostics: &mut Vec<Diagnostic>) {
    let bytes = line.as_bytes();

    for matched in ASSIGNMENT_PATTERN.find_iter(line) {
        let Some(equal_offset) = matched.as_str().find('=') else {
            continue;
        };
        let equal_byte = matched.start() + equal_offset;

        if bytes.get(equal_byte + 1) == Some(&b'=') {
            continue;
        }
        if equal_byte > 0 && matches!(bytes[equal_byte - 1], b'!' | b'<' | b'>') {
            continue;
        }

        let column = character_column(line, equal_byte);
        diagnostics.push(Diagnostic {
            range: single_line_range(line_number, column, column + 1),
            severity: Some(DiagnosticSeverity::WARNING),
            message: "Did you mean ':=' for assignment instead of '='?".to_string(),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            ..Default::default()
        });
    }
}

/// Spell-checks identifier-shaped tokens against the keyword table. The
/// suggestion is the first keyword in table order within edit distance 2,
/// not the globally closest one; every occurrence of a repeated token
/// reports at the token's first column.
fn check_unknown_tokens(
    line: &str,
    line_number: u32,
    lexicon: &Lexicon,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for matched in IDENTIFIER_PATTERN.find_iter(line) {
        let token = matched.as_str();

        if lexicon.contains(token) || COMMON_IDENTIFIERS.contains(&token) {
            continue;
        }
        if token.starts_with(|c: char| c.is_ascii_digit()) || token.chars().count() <= 2 {
            continue;
        }

        let lowered = token.to_lowercase();
        let suggestion = lexicon.keywords().iter().find(|keyword| {
            let keyword_lowered = keyword.name.to_lowercase();
            keyword_lowered != lowered && edit_distance(&lowered, &keyword_lowered) <= 2
        });

        if let Some(keyword) = suggestion {
            let token_byte = line.find(token).unwrap_or(matched.start());
            let column = character_column(line, token_byte);
            diagnostics.push(Diagnostic {
                range: single_line_range(
                    line_number,
                    column,
                    column + token.chars().count() as u32,
                ),
                severity: Some(DiagnosticSeverity::INFORMATION),
                message: format!("Unknown token '{}'. Did you mean '{}'?", token, keyword.name),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                ..Default::default()
            });
        }
    }
}

/// Checks `var` declarations for a type clause and `def` signatures with a
/// return type for colon syntax. The substring probes are asymmetric
/// (`" is "` for var, `"is "` for def); clients pin the resulting ranges.
fn check_declaration_syntax(line: &str, line_number: u32, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(var_byte) = line.find("var ") {
        if !line.contains(" is ") {
            diagnostics.push(Diagnostic {
                range: single_line_range(
                    line_number,
                    character_column(line, var_byte),
                    line_width(line),
                ),
                severity: Some(DiagnosticSeverity::ERROR),
                message: "Variable declaration must specify a type (var name is type)".to_string(),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                ..Default::default()
            });
        }
    }

    if let Some(def_byte) = line.find("def ") {
        if line.contains("is ") && !line.contains(':') {
            diagnostics.push(Diagnostic {
                range: single_line_range(
                    line_number,
                    character_column(line, def_byte),
                    line_width(line),
                ),
                severity: Some(DiagnosticSeverity::WARNING),
                message: "Function definition with return type should use colon syntax (def name is returnType: params as type)"
                    .to_string(),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                ..Default::default()
            });
        }
    }
}
