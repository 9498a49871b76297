//! Statement-level CQL script splitter.
//!
//! The splitter does not understand CQL grammar; it only tracks the lexical
//! structure needed to find statement boundaries: line comments (`--`, `//`),
//! non-nesting block comments (`/* ... */`), and single- or double-quoted
//! literals with doubled-quote escaping.

use crate::error::{CqlError, CqlResult};

/// Split a CQL script into an ordered list of non-empty statements.
///
/// Statements are delimited by `;` at top level. Comments are stripped;
/// a `;` inside a quoted literal or a comment does not delimit. Each
/// returned statement is trimmed and carries no trailing semicolon.
pub fn split_statements(script: &str) -> CqlResult<Vec<String>> {
    let chars: Vec<char> = script.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                current.push(c);
                i += 1;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                i = skip_line_comment(&chars, i + 2);
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                i = skip_line_comment(&chars, i + 2);
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let opened_on = line;
                i += 2;
                let mut closed = false;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        closed = true;
                        break;
                    }
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if !closed {
                    return Err(CqlError::UnterminatedBlockComment { line: opened_on });
                }
                // Substitute a space so adjacent tokens stay separated
                current.push(' ');
            }
            '\'' | '"' => {
                i = consume_literal(&chars, i, &mut current, &mut line)?;
            }
            ';' => {
                flush(&mut current, &mut statements);
                i += 1;
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    flush(&mut current, &mut statements);
    Ok(statements)
}

/// Advance past a line comment body, leaving the newline for the main loop.
fn skip_line_comment(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

/// Copy a quoted literal into `current`, honouring doubled-quote escapes.
///
/// `i` points at the opening quote. Returns the index just past the closing
/// quote, or fails if the script ends inside the literal.
fn consume_literal(
    chars: &[char],
    mut i: usize,
    current: &mut String,
    line: &mut usize,
) -> CqlResult<usize> {
    let quote = chars[i];
    let opened_on = *line;
    current.push(quote);
    i += 1;

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            if chars.get(i + 1) == Some(&quote) {
                current.push(quote);
                current.push(quote);
                i += 2;
                continue;
            }
            current.push(quote);
            return Ok(i + 1);
        }
        if c == '\n' {
            *line += 1;
        }
        current.push(c);
        i += 1;
    }

    Err(CqlError::UnterminatedLiteral {
        line: opened_on,
        quote,
    })
}

/// Push the trimmed statement if non-empty and reset the buffer.
fn flush(current: &mut String, statements: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
