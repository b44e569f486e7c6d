// ==========================================
// Marcenaria Track - Erros da camada de API
// ==========================================
// Responsabilidade: converter erros técnicos das camadas internas
// em erros de negócio com mensagem legível para o operador
// ==========================================

use crate::domain::ImportIssue;
use crate::importer::error::ImportError as ImporterError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Erros expostos pela camada de API
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Erros de entrada e de regra
    // ==========================================
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    #[error("recurso não encontrado: {0}")]
    NotFound(String),

    #[error("regra de negócio violada: {0}")]
    BusinessRuleViolation(String),

    #[error("transição de estado inválida: de {from} para {to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // Erros de importação
    // ==========================================
    /// Arquivo analisado mas sem nenhuma linha aproveitável
    #[error("importação rejeitada: {reason}")]
    ImportRejected {
        reason: String,
        issues: Vec<ImportIssue>,
    },

    #[error("falha na importação: {0}")]
    ImportError(String),

    // ==========================================
    // Erros de acesso a dados
    // ==========================================
    #[error("erro de banco de dados: {0}")]
    DatabaseError(String),

    #[error("falha de conexão com o banco: {0}")]
    DatabaseConnectionError(String),

    #[error("falha de transação no banco: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // Erros genéricos
    // ==========================================
    #[error("erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// Conversão de RepositoryError
// Objetivo: traduzir o erro técnico em mensagem de negócio
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={}) não existe", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("falha na trava do banco: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("violação de chave única: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("violação de integridade: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// Conversão de ImportError (módulo de importação)
// ==========================================
// O caso NoValidRecords preserva as ocorrências: a tela de
// importação as exibe mesmo quando o lote inteiro é rejeitado.
impl From<ImporterError> for ApiError {
    fn from(err: ImporterError) -> Self {
        let reason = err.to_string();
        match err {
            ImporterError::NoValidRecords { issues, .. } => {
                ApiError::ImportRejected { reason, issues }
            }
            ImporterError::Repository(repo_err) => ApiError::from(repo_err),
            ImporterError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Alias de Result da camada
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// Validações de entrada
// ==========================================

/// Garante que um campo textual obrigatório veio preenchido
///
/// # Parâmetros
/// - value: valor recebido da interface
/// - field: nome do campo exibido na mensagem
pub fn validate_required_text(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!(
            "campo obrigatório vazio: {}",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_validation() {
        assert!(validate_required_text("BC123", "codigo").is_ok());

        let err = validate_required_text("   ", "codigo").unwrap_err();
        match err {
            ApiError::InvalidInput(msg) => assert!(msg.contains("codigo")),
            _ => panic!("esperava InvalidInput"),
        }
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "piece".to_string(),
            id: "WS1_BC123".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("piece"));
                assert!(msg.contains("WS1_BC123"));
            }
            _ => panic!("esperava NotFound"),
        }

        let repo_err = RepositoryError::InvalidStateTransition {
            from: "SHIPPED".to_string(),
            to: "SHIPPED".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_import_rejection_preserves_issues() {
        use crate::domain::{IssueKind, IssueSeverity, RowLocator};

        let issue = ImportIssue {
            kind: IssueKind::InvalidBarcode,
            severity: IssueSeverity::Error,
            field: Some("codigo".to_string()),
            locator: RowLocator::Line(1),
            message: "código inválido".to_string(),
            suggestion: None,
        };
        let import_err = ImporterError::NoValidRecords {
            row_count: 1,
            issues: vec![issue],
        };

        let api_err: ApiError = import_err.into();
        match api_err {
            ApiError::ImportRejected { reason, issues } => {
                assert!(reason.contains("nenhuma linha válida"));
                assert_eq!(issues.len(), 1);
            }
            _ => panic!("esperava ImportRejected"),
        }
    }
}
