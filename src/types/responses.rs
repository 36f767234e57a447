//! Corpos de resposta da API do Codesage.

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisResult;

/// Resultado de `explain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainResponse {
    /// Explicação gerada pelo modelo (markdown).
    pub explanation: String,
}

/// Resultado de `infer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferResponse {
    /// Texto gerado pelo modelo.
    pub text: String,
}

/// Grupo de funções duplicadas e o que fazer com ele.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorHint {
    /// Membros do grupo unidos por ` & `.
    pub symbol: String,

    /// Refatoração sugerida.
    pub suggestion: String,
}

/// Resultado de `analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Findings de estilo, uma string por violação.
    pub findings: Vec<String>,

    /// Hints de funções duplicadas.
    pub refactors: Vec<RefactorHint>,

    /// Entrada normalizada.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            findings: result.findings.iter().map(ToString::to_string).collect(),
            refactors: result.refactors,
            formatted: result.formatted,
        }
    }
}

/// Corpo de erro de toda requisição que falha.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Categoria do erro (`validation`, `configuration`, `upstream`, `internal`).
    pub error: String,

    /// Mensagem para exibição.
    pub detail: String,

    /// Status HTTP do upstream, quando a API respondeu.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Cria um corpo de erro sem status do upstream.
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: detail.into(),
            status: None,
        }
    }

    /// Anexa o status do upstream.
    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }
}
