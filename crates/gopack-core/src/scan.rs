//! Import/export reference scanning.
//!
//! Finds every dynamic `import(...)` call and every static `import` or
//! `export ... from` declaration that carries a module specifier, without
//! parsing JavaScript. The scanner walks the byte stream once, skipping
//! comments and string literals that are not part of import/export
//! syntax, and records byte spans so specifiers can be patched in place
//! later.
//!
//! Matching is structural, not semantic. Template-literal specifiers are
//! ignored, and unusual constructs the scanner does not model (regex
//! literals holding quote characters, templates nested inside `${}`) can
//! still confuse a scan. Statements are reported in textual order and
//! never deduplicated; each occurrence owns its own span.
//!
//! The scanner operates on raw bytes and decodes nothing but the
//! extracted specifier substrings, so modules containing invalid UTF-8
//! scan the same as any other.

use std::ops::Range;

/// Upper bound on how far a clause scan looks for `from` after an
/// `import`/`export` keyword. Guards against unbalanced brackets in
/// malformed input.
const CLAUSE_SCAN_LIMIT: usize = 4096;

/// How a reference appears in the module text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `import("...")` call.
    DynamicCall,
    /// `import ... from "..."`, `import "..."`, or `export ... from "..."`.
    StaticDeclaration,
}

/// A single import/export occurrence in a module's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Classification of the matched statement.
    pub kind: RefKind,
    /// Byte span of the whole statement, from the keyword through the
    /// specifier and a directly following `)` or `;` when present.
    pub statement: Range<usize>,
    /// Byte span of the quoted specifier, including both quotes.
    pub specifier_span: Range<usize>,
    /// The specifier with its quotes removed, decoded lossily.
    pub specifier: String,
    /// The quote character delimiting the specifier (`'` or `"`).
    pub quote: char,
}

/// Scan module source bytes for import/export references.
///
/// Dynamic-call and static-declaration references come back interleaved
/// in textual order. `export` declarations without a `from` clause carry
/// no specifier and are not reported; side-effect imports
/// (`import './x.js';`) are.
#[must_use]
pub fn scan_references(bytes: &[u8]) -> Vec<Reference> {
    let len = bytes.len();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'/' if i + 1 < len && bytes[i + 1] == b'/' => {
                i = skip_line_comment(bytes, i);
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i = skip_block_comment(bytes, i);
            }
            // A string here is not part of import/export syntax; treat it
            // as opaque so quoted text cannot masquerade as a statement.
            b'\'' | b'"' | b'`' => {
                i = skip_string(bytes, i);
            }
            _ if matches_keyword(bytes, i, b"import") => {
                if let Some((reference, end)) = scan_import(bytes, i) {
                    refs.push(reference);
                    i = end;
                } else {
                    i += b"import".len();
                }
            }
            _ if matches_keyword(bytes, i, b"export") => {
                let clause_start = i + b"export".len();
                if let Some((reference, end)) = scan_clause_from(bytes, i, clause_start) {
                    refs.push(reference);
                    i = end;
                } else {
                    i += b"export".len();
                }
            }
            _ => i += 1,
        }
    }

    refs
}

/// Scan one `import` occurrence: the dynamic call form, the side-effect
/// form, or the clause form with `from`.
fn scan_import(bytes: &[u8], kw_start: usize) -> Option<(Reference, usize)> {
    let len = bytes.len();
    let i = skip_ws(bytes, kw_start + b"import".len());

    // Dynamic call: import ( <string> )
    if i < len && bytes[i] == b'(' {
        let spec_start = skip_ws(bytes, i + 1);
        let (span, quote, after) = scan_specifier(bytes, spec_start)?;
        let close = skip_ws(bytes, after);
        let end = if close < len && bytes[close] == b')' {
            close + 1
        } else {
            after
        };
        let reference = make_reference(bytes, RefKind::DynamicCall, kw_start..end, span, quote);
        return Some((reference, end));
    }

    // Side-effect form: import <string> ;
    if i < len && (bytes[i] == b'\'' || bytes[i] == b'"') {
        let (span, quote, after) = scan_specifier(bytes, i)?;
        let end = statement_end(bytes, after);
        let reference =
            make_reference(bytes, RefKind::StaticDeclaration, kw_start..end, span, quote);
        return Some((reference, end));
    }

    // Clause form: import <clause> from <string> ;
    scan_clause_from(bytes, kw_start, i)
}

/// Scan forward from an `import`/`export` keyword for a `from <string>`
/// clause. Bracket depth is tracked so multiline brace lists work and an
/// identifier named `from` inside braces is not mistaken for the keyword.
///
/// Returns `None` when the statement carries no specifier: plain
/// declarations, `export { .. };` without `from`, or a statement ending
/// at `;` first.
fn scan_clause_from(
    bytes: &[u8],
    kw_start: usize,
    clause_start: usize,
) -> Option<(Reference, usize)> {
    let len = bytes.len();
    let limit = len.min(clause_start + CLAUSE_SCAN_LIMIT);
    let mut depth: i32 = 0;
    let mut i = clause_start;

    while i < limit {
        match bytes[i] {
            b'/' if i + 1 < len && bytes[i + 1] == b'/' => i = skip_line_comment(bytes, i),
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => i = skip_block_comment(bytes, i),
            b'\'' | b'"' | b'`' => i = skip_string(bytes, i),
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                // Closing a bracket we never opened: the statement ended
                // inside an enclosing block.
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                i += 1;
            }
            b';' if depth == 0 => return None,
            _ if depth == 0 && matches_keyword(bytes, i, b"from") => {
                let spec_start = skip_ws(bytes, i + b"from".len());
                if let Some((span, quote, after)) = scan_specifier(bytes, spec_start) {
                    let end = statement_end(bytes, after);
                    let reference = make_reference(
                        bytes,
                        RefKind::StaticDeclaration,
                        kw_start..end,
                        span,
                        quote,
                    );
                    return Some((reference, end));
                }
                i += b"from".len();
            }
            _ => i += 1,
        }
    }

    None
}

/// Scan a quoted specifier starting at `i`. Returns the span including
/// both quotes, the quote character, and the index just past the closing
/// quote. Specifiers may not span lines; template literals are not
/// recognized here.
fn scan_specifier(bytes: &[u8], i: usize) -> Option<(Range<usize>, char, usize)> {
    let len = bytes.len();
    if i >= len || (bytes[i] != b'\'' && bytes[i] != b'"') {
        return None;
    }
    let quote = bytes[i];
    let mut j = i + 1;
    while j < len {
        match bytes[j] {
            b'\\' if j + 1 < len => j += 2,
            b'\n' => return None,
            b if b == quote => return Some((i..j + 1, char::from(quote), j + 1)),
            _ => j += 1,
        }
    }
    None
}

/// Extend a statement span over a directly following semicolon.
fn statement_end(bytes: &[u8], after_quote: usize) -> usize {
    if after_quote < bytes.len() && bytes[after_quote] == b';' {
        after_quote + 1
    } else {
        after_quote
    }
}

fn make_reference(
    bytes: &[u8],
    kind: RefKind,
    statement: Range<usize>,
    specifier_span: Range<usize>,
    quote: char,
) -> Reference {
    let inner = &bytes[specifier_span.start + 1..specifier_span.end - 1];
    Reference {
        kind,
        statement,
        specifier_span,
        specifier: String::from_utf8_lossy(inner).into_owned(),
        quote,
    }
}

/// Keyword match with identifier boundaries on both sides.
fn matches_keyword(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
    let end = pos + keyword.len();
    if end > bytes.len() || &bytes[pos..end] != keyword {
        return false;
    }
    if pos > 0 && is_ident_byte(bytes[pos - 1]) {
        return false;
    }
    if end < bytes.len() && is_ident_byte(bytes[end]) {
        return false;
    }
    true
}

/// Bytes that can continue an identifier. Non-ASCII bytes count as
/// identifier-ish so multibyte identifiers never produce a keyword match.
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Skip past a `// ...` comment. Returns the index of the newline or EOF.
fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Skip past a `/* ... */` comment, or to EOF when unterminated.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Skip an opaque string or template literal starting at `start`.
/// Single- and double-quoted strings stop at an unescaped newline
/// (unterminated literal); template literals run until their closing
/// backtick.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let len = bytes.len();
    let mut i = start + 1;
    while i < len {
        match bytes[i] {
            b'\\' if i + 1 < len => i += 2,
            b'\n' if quote != b'`' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    len
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}
