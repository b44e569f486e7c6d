// ==========================================
// Marcenaria Track - Erros do módulo de importação
// ==========================================
// Ferramenta: macro derive do thiserror
// ==========================================
// Dois planos de erro: ImportError interrompe a análise inteira
// (arquivo ilegível, lote vazio); ImportIssue marca linhas e deixa
// o pipeline seguir. Este arquivo define apenas o primeiro plano.
// ==========================================

use crate::domain::ImportIssue;
use crate::repository::RepositoryError;
use thiserror::Error;

/// Erro fatal da importação (rejeita o arquivo inteiro)
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Erros de arquivo =====
    #[error("arquivo não encontrado: {0}")]
    FileNotFound(String),

    #[error("formato não suportado: {0} (apenas .csv e .pdf)")]
    UnsupportedExtension(String),

    #[error("arquivo muito grande: {size} bytes (limite {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("falha ao ler o arquivo: {0}")]
    FileRead(String),

    // ===== Erros do CSV =====
    #[error("arquivo com poucas linhas de dados: {rows} (mínimo {min})")]
    TooFewRows { rows: usize, min: usize },

    #[error("o arquivo parece conter linha de cabeçalho; exporte o manifesto sem cabeçalho")]
    HeaderRowDetected,

    // ===== Erros do PDF =====
    #[error("PDF corrompido ou ilegível: {0}")]
    PdfCorrupted(String),

    #[error("PDF protegido por senha")]
    PdfPasswordProtected,

    #[error("layout inesperado na página {page}: {message}")]
    PdfLayout { page: u32, message: String },

    // ===== Erros de lote =====
    #[error("nenhuma linha válida entre {row_count} linha(s) do arquivo")]
    NoValidRecords {
        row_count: usize,
        issues: Vec<ImportIssue>, // ocorrências coletadas, para exibição
    },

    // ===== Erros de infraestrutura =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Implementa From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileRead(err.to_string())
    }
}

// Implementa From<lopdf::Error>
impl From<lopdf::Error> for ImportError {
    fn from(err: lopdf::Error) -> Self {
        ImportError::PdfCorrupted(err.to_string())
    }
}

/// Alias de Result do módulo
pub type ImportResult<T> = Result<T, ImportError>;
