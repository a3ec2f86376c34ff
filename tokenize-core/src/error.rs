//! # Erros do Estágio de Tokenização
//!
//! Todas as falhas sobem até quem chamou `process`. Não existe retry nem
//! documento "degradado": ou o documento sai completo, ou sai um erro.

use thiserror::Error;

/// Erro opaco vindo de um colaborador externo (modelo ou tokenizador).
pub type ExternalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Falhas possíveis do estágio.
#[derive(Debug, Error)]
pub enum TokenizeError {
    /// A forma da entrada não é aceita pela estratégia ativa
    /// (ex: lista de sentenças quando só texto cru é permitido).
    #[error("entrada do tipo '{found}' não é aceita pela estratégia {strategy}")]
    InvalidInputKind {
        strategy: &'static str,
        found: &'static str,
    },

    /// O modelo ou o tokenizador externo falhou. Repassado sem alteração.
    #[error(transparent)]
    ExternalDependency(ExternalError),

    /// O pré-processador de chunks produziu algo incompatível com a entrada.
    #[error("resultado de chunking malformado: {reason}")]
    MalformedChunkingResult { reason: String },

    /// A saída do modelo não casa com os batches enviados.
    #[error("predição inconsistente do modelo: {reason}")]
    InconsistentPrediction { reason: String },

    /// A estratégia configurada precisa de um colaborador que não foi fornecido.
    #[error("colaborador ausente: {0}")]
    MissingCollaborator(&'static str),

    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("falha ao ler configuração: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("falha ao interpretar configuração: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Um documento não respeita os invariantes de ids/offsets.
    #[error("invariante do documento violado: {0}")]
    InvariantViolation(String),
}

impl TokenizeError {
    /// Envolve um erro de colaborador externo.
    pub fn external(err: impl Into<ExternalError>) -> Self {
        TokenizeError::ExternalDependency(err.into())
    }

    /// Erros causados pela entrada ou configuração de quem chamou
    /// (em oposição a falhas internas ou de colaboradores).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TokenizeError::InvalidInputKind { .. }
                | TokenizeError::InvalidConfig(_)
                | TokenizeError::ConfigParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TokenizeError>;
