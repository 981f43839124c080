//! glyphc-pp - the Glyph macro preprocessor.
//!
//! Runs before the lexer. A single construct is recognized:
//!
//! ```text
//! ⚡ NAME(p1, p2) 👉 body to end of line     text macro
//! ⚡ NAME 👉 body to end of line             constant macro
//! ⚡ expr                                    left for the parser (comptime)
//! ```
//!
//! The 👉 separator is what distinguishes a macro definition from a
//! comptime expression. Definition lines are consumed; everything else
//! passes through verbatim. Expansion re-runs until a fixpoint, bounded at
//! 16 passes so nested macros terminate. String literals and `//` comments
//! are never scanned for macro names.

use rustc_hash::FxHashMap;

/// The macro marker, `⚡` (U+26A1).
const MARKER: char = '\u{26A1}';
/// The definition separator, `👉` (U+1F449).
const SEPARATOR: char = '\u{1F449}';
/// Emoji variation selector, skipped after either symbol.
const VARIATION_SELECTOR: char = '\u{FE0F}';
/// Expansion pass bound.
const MAX_PASSES: usize = 16;
/// Parameter count bound per macro.
const MAX_PARAMS: usize = 8;

#[derive(Debug, Clone)]
struct Macro {
    params: Vec<String>,
    body: String,
}

/// Registered macros for one preprocessor invocation.
///
/// Created fresh per call to [`preprocess`]; there is no cross-invocation
/// state.
#[derive(Debug, Default)]
struct MacroTable {
    macros: FxHashMap<String, Macro>,
}

impl MacroTable {
    fn define(&mut self, name: String, params: Vec<String>, body: String) {
        // First definition wins
        self.macros.entry(name).or_insert(Macro { params, body });
    }

    fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Expand all macros in `src`.
///
/// Pure: the output depends only on the input text.
pub fn preprocess(src: &str) -> String {
    let mut table = MacroTable::default();
    let mut cur = collect(src, &mut table);
    if table.is_empty() {
        return cur;
    }
    for _ in 0..MAX_PASSES {
        match expand(&cur, &table) {
            Some(next) => cur = next,
            None => break,
        }
    }
    cur
}

/// Consume `marker` (plus an optional variation selector) at the front of
/// `s`, returning the rest.
fn strip_symbol(s: &str, symbol: char) -> Option<&str> {
    let rest = s.strip_prefix(symbol)?;
    Some(rest.strip_prefix(VARIATION_SELECTOR).unwrap_or(rest))
}

/// Split a `⚡ NAME(params) 👉 body` line into its parts, or `None` when
/// the line is not a macro definition.
fn parse_definition(line: &str) -> Option<(String, Vec<String>, String)> {
    let s = line.trim_start_matches([' ', '\t']);
    let s = strip_symbol(s, MARKER)?;
    let s = s.trim_start_matches([' ', '\t']);

    let name_end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    if name_end == 0 || !s.starts_with(is_ident_start) {
        return None;
    }
    let name = s[..name_end].to_string();
    let mut s = &s[name_end..];

    let mut params = Vec::new();
    if let Some(rest) = s.strip_prefix('(') {
        let close = rest.find(')')?;
        for p in rest[..close].split(',') {
            let p = p.trim();
            if !p.is_empty() {
                if params.len() >= MAX_PARAMS {
                    return None;
                }
                params.push(p.to_string());
            }
        }
        s = &rest[close + 1..];
    }

    let s = s.trim_start_matches([' ', '\t']);
    let body = strip_symbol(s, SEPARATOR)?;
    let body = body.trim_start_matches([' ', '\t']).trim_end_matches('\n');
    Some((name, params, body.to_string()))
}

/// Pass 1: collect definitions, emit every other line verbatim.
fn collect(src: &str, table: &mut MacroTable) -> String {
    let mut out = String::with_capacity(src.len());
    for line in src.split_inclusive('\n') {
        match parse_definition(line) {
            Some((name, params, body)) => table.define(name, params, body),
            None => out.push_str(line),
        }
    }
    out
}

/// Copy a string literal starting at the opening quote, returning the rest.
fn copy_string<'a>(s: &'a str, out: &mut String) -> &'a str {
    let mut chars = s.char_indices();
    let (_, quote) = chars.next().expect("caller checked the quote");
    out.push(quote);
    let mut escaped = false;
    for (i, c) in chars {
        out.push(c);
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return &s[i + c.len_utf8()..];
        }
    }
    ""
}

/// Split a parenthesized argument list at `s` (positioned just past the
/// opening paren) on top-level commas, string-aware. Returns the arguments
/// and the rest of the input past the closing paren.
fn split_args(s: &str) -> (Vec<String>, &str) {
    let mut args = Vec::new();
    let mut depth = 1usize;
    let mut arg_start = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(s[arg_start..i].to_string());
                    return (args, &s[i + 1..]);
                }
            },
            ',' if depth == 1 => {
                args.push(s[arg_start..i].to_string());
                arg_start = i + 1;
            },
            _ => {},
        }
    }
    args.push(s[arg_start..].to_string());
    (args, "")
}

/// Substitute parameter occurrences in a macro body.
fn substitute(body: &str, params: &[String], args: &[String], out: &mut String) {
    let mut rest = body;
    while !rest.is_empty() {
        let c = rest.chars().next().expect("rest is non-empty");
        if c == '"' {
            rest = copy_string(rest, out);
            continue;
        }
        if is_ident_start(c) {
            let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            let word = &rest[..end];
            match params.iter().position(|p| p == word) {
                Some(i) if i < args.len() => out.push_str(&args[i]),
                _ => out.push_str(word),
            }
            rest = &rest[end..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
}

/// Pass 2+: expand one round of macro invocations. `None` when the pass
/// changed nothing.
fn expand(src: &str, table: &MacroTable) -> Option<String> {
    let mut out = String::with_capacity(src.len());
    let mut changed = false;
    let mut rest = src;
    let mut prev_ident = false;
    while !rest.is_empty() {
        let c = rest.chars().next().expect("rest is non-empty");
        if c == '"' {
            rest = copy_string(rest, &mut out);
            prev_ident = false;
            continue;
        }
        if rest.starts_with("//") {
            let end = rest.find('\n').unwrap_or(rest.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            prev_ident = false;
            continue;
        }
        if is_ident_start(c) && !prev_ident {
            let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            let word = &rest[..end];
            rest = &rest[end..];
            match table.get(word) {
                Some(m) if !m.params.is_empty() && rest.starts_with('(') => {
                    let (args, after) = split_args(&rest[1..]);
                    substitute(&m.body, &m.params, &args, &mut out);
                    rest = after;
                    changed = true;
                },
                Some(m) if m.params.is_empty() => {
                    out.push_str(&m.body);
                    changed = true;
                },
                _ => out.push_str(word),
            }
            prev_ident = false;
            continue;
        }
        out.push(c);
        prev_ident = is_ident_char(c);
        rest = &rest[c.len_utf8()..];
    }
    changed.then_some(out)
}
