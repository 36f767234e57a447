//! Duplicate-function detection.
//!
//! Two functions are duplicates when their bodies normalize to the same token
//! stream. Comments are dropped at extraction: `#` for `def` bodies, `//` for
//! brace bodies. Normalization drops whitespace, renames parameters to
//! positional placeholders (`$0`, `$1`, ...) and renames names bound inside
//! the body (`x = ...` outside brackets, `for x in`) to local placeholders
//! (`%0`, `%1`, ...) in order of first binding. Attribute names after a `.` are never renamed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use super::{indent_of, strip_comment, CommentSyntax};
use crate::types::responses::RefactorHint;

/// A function-like definition found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,

    /// 1-based line of the header.
    pub line: usize,

    /// Parameter names, in declaration order.
    pub params: Vec<String>,

    /// Body text with comments removed.
    pub body: String,
}

fn python_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*(?:->[^:]*)?:(.*)$")
            .expect("python def pattern is valid")
    })
}

fn brace_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:pub(?:\([^)]*\))?|export|async|const|unsafe)\s+)*(?:fn|function)\s+([A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\(([^)]*)\)[^{;]*\{(.*)$",
        )
        .expect("brace fn pattern is valid")
    })
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[A-Za-z_]\w*|\d[\w.]*|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|\S"#)
            .expect("token pattern is valid")
    })
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_]\w*").expect("identifier pattern is valid"))
}

/// Finds `def` functions (indentation bodies) and `fn` / `function`
/// definitions (brace bodies).
pub fn extract_functions(code: &str) -> Vec<FunctionDef> {
    let lines: Vec<&str> = code.lines().collect();
    let mut functions = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if let Some(caps) = python_def_re().captures(strip_comment(line, CommentSyntax::Hash)) {
            let inline = caps.get(3).map_or("", |m| m.as_str()).trim();
            let body = if inline.is_empty() {
                indented_body(&lines, index)
            } else {
                inline.to_string()
            };
            functions.push(FunctionDef {
                name: caps[1].to_string(),
                line: index + 1,
                params: parse_params(&caps[2]),
                body,
            });
        } else if let Some(caps) =
            brace_fn_re().captures(strip_comment(line, CommentSyntax::DoubleSlash))
        {
            let rest = caps.get(3).map_or("", |m| m.as_str());
            functions.push(FunctionDef {
                name: caps[1].to_string(),
                line: index + 1,
                params: parse_params(&caps[2]),
                body: braced_body(rest, &lines[index + 1..]),
            });
        }
    }

    functions
}

/// Lines after `header_index` indented deeper than the header.
fn indented_body(lines: &[&str], header_index: usize) -> String {
    let header_indent = indent_of(lines[header_index]);
    let mut body = Vec::new();

    for line in &lines[header_index + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= header_indent {
            break;
        }
        body.push(strip_comment(line, CommentSyntax::Hash));
    }

    body.join("\n")
}

/// Text up to the brace matching the one that opened the body.
fn braced_body(first: &str, following: &[&str]) -> String {
    let mut depth = 1usize;
    let mut body = String::new();

    for line in std::iter::once(first).chain(following.iter().copied()) {
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for c in strip_comment(line, CommentSyntax::DoubleSlash).chars() {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return body;
                        }
                    }
                    _ => {}
                },
            }
            body.push(c);
        }
        body.push('\n');
    }

    body
}

/// Extracts parameter names from a parameter list.
///
/// Handles `a: int = 3`, `*args`, `&mut self`, `mut x: u8` and the like.
fn parse_params(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|param| {
            let param = param.trim();
            let param = param.strip_prefix("mut ").unwrap_or(param);
            let name_part = param.split([':', '=']).next().unwrap_or("");
            ident_re()
                .find_iter(name_part)
                .map(|m| m.as_str())
                .find(|ident| *ident != "mut")
                .map(str::to_string)
        })
        .collect()
}

/// Normalized, whitespace- and name-insensitive form of a comment-free body.
pub fn normalize_body(body: &str, params: &[String]) -> String {
    let tokens: Vec<&str> = token_re().find_iter(body).map(|m| m.as_str()).collect();

    let is_ident = |t: &str| t.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');

    // Bracket nesting before each token; `name=` inside a call is a keyword argument.
    let mut depth = 0usize;
    let depths: Vec<usize> = tokens
        .iter()
        .map(|token| {
            let current = depth;
            match *token {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                _ => {}
            }
            current
        })
        .collect();

    let mut locals: Vec<&str> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if !is_ident(token) || params.iter().any(|p| p == token) || locals.contains(token) {
            continue;
        }
        let after_dot = i > 0 && tokens[i - 1] == ".";
        let assigned = depths[i] == 0
            && tokens.get(i + 1) == Some(&"=")
            && tokens.get(i + 2) != Some(&"=");
        let loop_var = i > 0 && tokens[i - 1] == "for";
        if !after_dot && (assigned || loop_var) {
            locals.push(token);
        }
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let after_dot = i > 0 && tokens[i - 1] == ".";
            if !after_dot {
                if let Some(pos) = params.iter().position(|p| p == token) {
                    return format!("${}", pos);
                }
                if let Some(pos) = locals.iter().position(|l| l == token) {
                    return format!("%{}", pos);
                }
            }
            (*token).to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Groups functions with equivalent bodies into refactor hints.
///
/// Output depends only on the set of functions, not on their order.
pub fn find_duplicates(code: &str) -> Vec<RefactorHint> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for function in extract_functions(code) {
        let key = normalize_body(&function.body, &function.params);
        if matches!(key.as_str(), "" | "pass" | ". . .") {
            continue;
        }
        groups.entry(key).or_default().insert(function.name);
    }

    let mut hints: Vec<RefactorHint> = groups
        .into_values()
        .filter(|names| names.len() >= 2)
        .map(|names| {
            let names: Vec<String> = names.into_iter().collect();
            RefactorHint {
                symbol: names.join(" & "),
                suggestion: format!(
                    "Functions {} have identical bodies. Extract a single helper and reuse.",
                    list_names(&names)
                ),
            }
        })
        .collect();

    hints.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    hints
}

fn list_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("`{}`", n)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
