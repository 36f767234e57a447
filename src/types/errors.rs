//! Tipos de erro do Codesage.

use thiserror::Error;

/// Tipo de resultado padrão do Codesage.
pub type CodesageResult<T> = Result<T, CodesageError>;

/// Falhas do gateway de modelos hospedados.
///
/// Cada variante é uma condição distinta do upstream que a UI exibe por si só.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Credencial da API não configurada (defina HF_API_TOKEN ou [gateway].api_token)")]
    MissingCredential,

    #[error("Modelo desconhecido '{0}'")]
    UnknownModel(String),

    #[error("Upstream inacessível: {0}")]
    Network(String),

    #[error("Erro da API upstream ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Formato de resposta inesperado da API upstream: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Status HTTP informado pelo upstream, quando ele chegou a responder.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Erros possíveis no Codesage.
#[derive(Error, Debug)]
pub enum CodesageError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Requisição inválida: {0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Erro no cliente HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Erro no servidor: {0}")]
    Server(String),

    #[error("{0}")]
    Other(String),
}

impl CodesageError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de validação.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}
