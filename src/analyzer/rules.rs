//! Line-based style rules.
//!
//! Each rule looks at one source line (with the surrounding lines available
//! for lookahead) and reports at most one finding for it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::{code_portion, indent_of};

/// A single style violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// 1-based line number.
    pub line: usize,

    /// Identifier of the rule that fired.
    pub rule: &'static str,

    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What a rule gets to see.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    /// All lines of the input.
    pub lines: &'a [&'a str],

    /// 0-based index of the line under inspection.
    pub index: usize,
}

impl<'a> LineContext<'a> {
    /// The line under inspection.
    pub fn line(&self) -> &'a str {
        self.lines[self.index]
    }

    /// 1-based line number.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// A style rule.
pub trait LintRule: Send + Sync {
    /// Stable identifier.
    fn id(&self) -> &'static str;

    /// Returns a message if the line violates the rule.
    fn check(&self, ctx: &LineContext<'_>) -> Option<String>;
}

/// Default rule set, in reporting order.
pub fn default_rules(max_line_length: usize) -> Vec<Box<dyn LintRule>> {
    vec![
        Box::new(TabIndentRule),
        Box::new(DebugPrintRule),
        Box::new(BareExceptRule),
        Box::new(LineLengthRule {
            max: max_line_length,
        }),
        Box::new(NoneComparisonRule),
        Box::new(TrailingWhitespaceRule),
        Box::new(StubFunctionRule),
    ]
}

fn debug_print_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^.\w])(print|println!|dbg!|console\.log)\s*\(")
            .expect("debug print pattern is valid")
    })
}

fn bare_except_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*except\s*:(.*)$").expect("bare except pattern is valid"))
}

fn none_comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:==|!=)\s*None\b|\bNone\s*(?:==|!=)").expect("None pattern is valid")
    })
}

fn def_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(.*\)\s*(?:->[^:]*)?:(.*)$")
            .expect("def header pattern is valid")
    })
}

/// Indentation must use spaces.
#[derive(Debug, Default)]
pub struct TabIndentRule;

impl LintRule for TabIndentRule {
    fn id(&self) -> &'static str {
        "tab-indent"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let line = ctx.line();
        let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        if line[..indent_len].contains('\t') {
            Some("indentation uses tabs; use spaces instead".to_string())
        } else {
            None
        }
    }
}

/// Debug prints should go through a logger.
#[derive(Debug, Default)]
pub struct DebugPrintRule;

impl LintRule for DebugPrintRule {
    fn id(&self) -> &'static str {
        "debug-print"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let code = code_portion(ctx.line());
        let call = debug_print_re().captures(&code)?.get(1)?.as_str();
        Some(format!(
            "debug print `{}(...)`; prefer a logger in production code",
            call
        ))
    }
}

/// Catch specific exceptions.
#[derive(Debug, Default)]
pub struct BareExceptRule;

impl LintRule for BareExceptRule {
    fn id(&self) -> &'static str {
        "bare-except"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let code = code_portion(ctx.line());
        let handler = bare_except_re().captures(&code)?.get(1)?.as_str().trim();
        let message = if handler == "pass" {
            "bare `except: pass` silently swallows every error; \
             catch specific exceptions and handle them"
        } else {
            "bare `except:`; catch specific exceptions"
        };
        Some(message.to_string())
    }
}

/// Lines must fit within the configured width.
#[derive(Debug)]
pub struct LineLengthRule {
    /// Maximum length in characters.
    pub max: usize,
}

impl LintRule for LineLengthRule {
    fn id(&self) -> &'static str {
        "line-length"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let len = ctx.line().chars().count();
        if len > self.max {
            Some(format!("exceeds {} characters ({})", self.max, len))
        } else {
            None
        }
    }
}

/// `is None` instead of equality.
#[derive(Debug, Default)]
pub struct NoneComparisonRule;

impl LintRule for NoneComparisonRule {
    fn id(&self) -> &'static str {
        "none-comparison"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        if none_comparison_re().is_match(&code_portion(ctx.line())) {
            Some("use `is None` / `is not None` instead of `==` / `!=`".to_string())
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct TrailingWhitespaceRule;

impl LintRule for TrailingWhitespaceRule {
    fn id(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let line = ctx.line();
        if line.ends_with([' ', '\t']) {
            Some("trailing whitespace; remove it for clean diffs".to_string())
        } else {
            None
        }
    }
}

/// Functions whose whole body is `pass` or `...`.
#[derive(Debug, Default)]
pub struct StubFunctionRule;

impl StubFunctionRule {
    fn is_placeholder(text: &str) -> bool {
        matches!(text.trim(), "pass" | "...")
    }
}

impl LintRule for StubFunctionRule {
    fn id(&self) -> &'static str {
        "stub-function"
    }

    fn check(&self, ctx: &LineContext<'_>) -> Option<String> {
        let header = code_portion(ctx.line());
        let caps = def_header_re().captures(&header)?;
        let name = caps.get(1)?.as_str();
        let inline = caps.get(2).map_or("", |m| m.as_str()).trim();

        let is_stub = if inline.is_empty() {
            let header_indent = indent_of(ctx.line());
            let mut body = ctx.lines[ctx.index + 1..]
                .iter()
                .filter(|l| !l.trim().is_empty())
                .take_while(|l| indent_of(l) > header_indent);
            match (body.next(), body.next()) {
                (Some(only), None) => Self::is_placeholder(&code_portion(only)),
                _ => false,
            }
        } else {
            Self::is_placeholder(inline)
        };

        if is_stub {
            Some(format!(
                "function `{}` is a stub; implement it or document the TODO",
                name
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rule: &dyn LintRule, source: &str, index: usize) -> Option<String> {
        let lines: Vec<&str> = source.lines().collect();
        rule.check(&LineContext {
            lines: &lines,
            index,
        })
    }

    #[test]
    fn test_tab_indent_only_in_leading_whitespace() {
        assert!(check(&TabIndentRule, "\treturn 1", 0).is_some());
        assert!(check(&TabIndentRule, "  \t x = 1", 0).is_some());
        assert!(check(&TabIndentRule, "x = 'a\tb'", 0).is_none());
    }

    #[test]
    fn test_debug_print_variants() {
        assert!(check(&DebugPrintRule, "print(x)", 0).is_some());
        assert!(check(&DebugPrintRule, "    console.log('hi')", 0).is_some());
        assert!(check(&DebugPrintRule, "dbg!(value);", 0).is_some());
        assert!(check(&DebugPrintRule, "self.print(x)", 0).is_none());
        assert!(check(&DebugPrintRule, "pprint(x)", 0).is_none());
        assert!(check(&DebugPrintRule, "# print(x)", 0).is_none());
        assert!(check(&DebugPrintRule, "msg = 'print(x)'", 0).is_none());
    }

    #[test]
    fn test_bare_except() {
        let msg = check(&BareExceptRule, "    except: pass", 0).unwrap();
        assert!(msg.contains("except: pass"));

        let msg = check(&BareExceptRule, "except:", 0).unwrap();
        assert!(msg.starts_with("bare `except:`"));

        assert!(check(&BareExceptRule, "except ValueError:", 0).is_none());
    }

    #[test]
    fn test_line_length_counts_chars() {
        let rule = LineLengthRule { max: 5 };
        assert!(check(&rule, "ééééé", 0).is_none());
        assert_eq!(
            check(&rule, "abcdef", 0).as_deref(),
            Some("exceeds 5 characters (6)")
        );
    }

    #[test]
    fn test_none_comparison() {
        assert!(check(&NoneComparisonRule, "if x == None:", 0).is_some());
        assert!(check(&NoneComparisonRule, "if None != x:", 0).is_some());
        assert!(check(&NoneComparisonRule, "if x is None:", 0).is_none());
        assert!(check(&NoneComparisonRule, "if x == NoneType:", 0).is_none());
    }

    #[test]
    fn test_trailing_whitespace() {
        assert!(check(&TrailingWhitespaceRule, "x = 1  ", 0).is_some());
        assert!(check(&TrailingWhitespaceRule, "x = 1", 0).is_none());
    }

    #[test]
    fn test_stub_function() {
        assert!(check(&StubFunctionRule, "def todo(): pass", 0).is_some());
        assert!(check(&StubFunctionRule, "def todo(a):\n    ...\n", 0).is_some());
        assert!(check(&StubFunctionRule, "def f():\n    pass\n    return 1", 0).is_none());
        assert!(check(&StubFunctionRule, "def f():\n    return 1", 0).is_none());
    }

    #[test]
    fn test_finding_serializes_as_string() {
        let finding = Finding {
            line: 3,
            rule: "trailing-whitespace",
            message: "trailing whitespace".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&finding).unwrap(),
            serde_json::json!("line 3: trailing whitespace")
        );
    }
}
