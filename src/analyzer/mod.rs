//! Heuristic code analyzer.
//!
//! Scans raw source text line by line; there is no parser involved. A run
//! produces:
//!
//! - style [`Finding`]s, in source-line order,
//! - [`RefactorHint`]s for groups of functions with equivalent bodies,
//! - an optional normalized rendering of the input (see [`format_code`]).
//!
//! Analysis never fails. Input it cannot make sense of simply produces no
//! findings.
//!
//! ## Example
//!
//! ```
//! use codesage::analyzer::Analyzer;
//! use codesage::types::config::AnalyzerConfig;
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let result = analyzer.analyze("def add(a, b): return a + b\ndef plus(x, y): return x + y\n");
//! assert_eq!(result.refactors.len(), 1);
//! ```

mod duplicates;
mod format;
mod rules;

pub use duplicates::{extract_functions, find_duplicates, normalize_body, FunctionDef};
pub use format::format_code;
pub use rules::{default_rules, Finding, LineContext, LintRule};

use crate::types::config::AnalyzerConfig;
use crate::types::responses::RefactorHint;

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Style findings in source order.
    pub findings: Vec<Finding>,

    /// Duplicate-function hints, sorted by symbol.
    pub refactors: Vec<RefactorHint>,

    /// Normalized rendering, when formatting is enabled.
    pub formatted: Option<String>,
}

/// Rule-based analyzer.
pub struct Analyzer {
    config: AnalyzerConfig,
    rules: Vec<Box<dyn LintRule>>,
}

impl Analyzer {
    /// Creates an analyzer with the default rule set.
    pub fn new(config: AnalyzerConfig) -> Self {
        let rules = default_rules(config.max_line_length);
        Self { config, rules }
    }

    /// Analyzer configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs every rule, the duplicate detector and the formatter.
    pub fn analyze(&self, code: &str) -> AnalysisResult {
        let findings = self.lint(code);
        let refactors = find_duplicates(code);
        let formatted = self
            .config
            .format
            .then(|| format_code(code, self.config.indent_width));

        tracing::debug!(
            lines = code.lines().count(),
            findings = findings.len(),
            refactors = refactors.len(),
            "Analysis completed"
        );

        AnalysisResult {
            findings,
            refactors,
            formatted,
        }
    }

    /// Runs the style rules only.
    pub fn lint(&self, code: &str) -> Vec<Finding> {
        let lines: Vec<&str> = code.lines().collect();
        let mut findings = Vec::new();

        for index in 0..lines.len() {
            let ctx = LineContext {
                lines: &lines,
                index,
            };
            for rule in &self.rules {
                if let Some(message) = rule.check(&ctx) {
                    findings.push(Finding {
                        line: ctx.number(),
                        rule: rule.id(),
                        message,
                    });
                }
            }
        }

        findings
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Convenience wrapper around [`Analyzer::analyze`].
pub fn analyze(code: &str, config: &AnalyzerConfig) -> AnalysisResult {
    Analyzer::new(config.clone()).analyze(code)
}

/// Width of the leading whitespace, counting a tab as one column.
pub(crate) fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Line comment syntax of a piece of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommentSyntax {
    /// `# ...` (Python, shell). `//` is floor division here.
    Hash,
    /// `// ...` (Rust, JavaScript, C family). `#` starts attributes here.
    DoubleSlash,
}

/// Cuts a trailing line comment, leaving string literals intact.
pub(crate) fn strip_comment(line: &str, syntax: CommentSyntax) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';

    for (i, c) in line.char_indices() {
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
                '#' if syntax == CommentSyntax::Hash => return &line[..i],
                '/' if syntax == CommentSyntax::DoubleSlash && prev == '/' => return &line[..i - 1],
                _ => {}
            },
        }
        prev = c;
    }

    line
}

/// The code part of a line: `#` comment removed and string contents masked.
///
/// Lines are read with `#` comments only, so `a // 2` stays visible. Quotes
/// are kept so the shape of the line survives; everything between
/// them becomes `_`.
pub(crate) fn code_portion(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in strip_comment(line, CommentSyntax::Hash).chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push('_');
                } else if c == '\\' {
                    escaped = true;
                    out.push('_');
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    out.push('_');
                }
            }
            None => {
                if matches!(c, '"' | '\'' | '`') {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }

    out
}
