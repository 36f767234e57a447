//! Terminal rendering of API results.

use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};

use crate::types::responses::AnalyzeResponse;

/// Shown when a renderer panics.
pub const RENDER_FALLBACK: &str = "Something went wrong while displaying the result.";

/// The three user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Explain,
    Analyze,
    Infer,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Explain => write!(f, "explain"),
            Action::Analyze => write!(f, "analyze"),
            Action::Infer => write!(f, "infer"),
        }
    }
}

/// What the result area currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Idle,
    Loading(Action),
    Explanation(String),
    Analysis(AnalyzeResponse),
    Text(String),
    Error(String),
}

impl View {
    /// Whether this view reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, View::Error(_))
    }
}

/// Result area state.
///
/// Starting an action always clears what was shown before, so a failed
/// action can never leave a stale result on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    current: View,
}

impl Default for ResultView {
    fn default() -> Self {
        Self { current: View::Idle }
    }
}

impl ResultView {
    /// Creates an idle view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` as in flight.
    pub fn begin(&mut self, action: Action) {
        self.current = View::Loading(action);
    }

    /// Shows the outcome of the last action.
    pub fn finish(&mut self, outcome: View) {
        self.current = outcome;
    }

    /// Current view.
    pub fn current(&self) -> &View {
        &self.current
    }

    /// Renders the current view behind the fault boundary.
    pub fn render(&self) -> String {
        render_boundary(|| render(&self.current))
    }
}

/// Runs `render`, substituting [`RENDER_FALLBACK`] if it panics.
pub fn render_boundary<F>(render: F) -> String
where
    F: FnOnce() -> String,
{
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(text) => text,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(reason = %reason, "Renderer panicked");
            RENDER_FALLBACK.to_string()
        }
    }
}

/// Plain-text rendering of a view.
pub fn render(view: &View) -> String {
    match view {
        View::Idle => String::new(),
        View::Loading(action) => format!("Running {}...\n", action),
        View::Explanation(text) => format!("== Explanation ==\n{}\n", text.trim_end()),
        View::Text(text) => format!("== Response ==\n{}\n", text.trim_end()),
        View::Error(message) => format!("Error: {}\n", message),
        View::Analysis(analysis) => render_analysis(analysis),
    }
}

fn render_analysis(analysis: &AnalyzeResponse) -> String {
    let mut out = String::new();

    out.push_str("== Findings ==\n");
    if analysis.findings.is_empty() {
        out.push_str("  No findings.\n");
    }
    for finding in &analysis.findings {
        let _ = writeln!(out, "  - {}", finding);
    }

    out.push_str("\n== Refactors ==\n");
    if analysis.refactors.is_empty() {
        out.push_str("  No duplicate functions detected.\n");
    }
    for hint in &analysis.refactors {
        let _ = writeln!(out, "  - {}: {}", hint.symbol, hint.suggestion);
    }

    if let Some(formatted) = &analysis.formatted {
        out.push_str("\n== Formatted ==\n");
        out.push_str(formatted);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::responses::RefactorHint;

    #[test]
    fn test_error_replaces_previous_result() {
        let mut view = ResultView::new();
        view.begin(Action::Infer);
        view.finish(View::Text("first answer".to_string()));
        assert!(view.render().contains("first answer"));

        view.begin(Action::Infer);
        assert_eq!(view.current(), &View::Loading(Action::Infer));

        view.finish(View::Error("upstream: connection refused".to_string()));
        let rendered = view.render();
        assert!(rendered.contains("connection refused"));
        assert!(!rendered.contains("first answer"));
    }

    #[test]
    fn test_boundary_catches_panics() {
        let rendered = render_boundary(|| panic!("broken renderer"));
        assert_eq!(rendered, RENDER_FALLBACK);
    }

    #[test]
    fn test_boundary_passes_output_through() {
        assert_eq!(render_boundary(|| "ok".to_string()), "ok");
    }

    #[test]
    fn test_render_analysis() {
        let analysis = AnalyzeResponse {
            findings: vec!["line 2: trailing whitespace".to_string()],
            refactors: vec![RefactorHint {
                symbol: "a & b".to_string(),
                suggestion: "Extract".to_string(),
            }],
            formatted: Some("x = 1\n".to_string()),
        };

        let rendered = render(&View::Analysis(analysis));
        assert!(rendered.contains("  - line 2: trailing whitespace"));
        assert!(rendered.contains("  - a & b: Extract"));
        assert!(rendered.ends_with("== Formatted ==\nx = 1\n"));
    }

    #[test]
    fn test_render_empty_analysis() {
        let analysis = AnalyzeResponse {
            findings: vec![],
            refactors: vec![],
            formatted: None,
        };
        let rendered = render(&View::Analysis(analysis));
        assert!(rendered.contains("No findings."));
        assert!(rendered.contains("No duplicate functions detected."));
    }
}
