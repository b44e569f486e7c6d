// ==========================================
// Marcenaria Track - Tipos do domínio
// ==========================================
// Enums compartilhados entre importação, produção e expedição
// Serialização: SCREAMING_SNAKE_CASE (igual ao banco)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Origem do manifesto (Import Source)
// ==========================================
// Cada origem tem regras próprias de validação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportSource {
    HaixunCsv, // Exportação CSV da seccionadora Haixun
    PromobPdf, // Etiquetas PDF geradas pelo Promob
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::HaixunCsv => write!(f, "HAIXUN_CSV"),
            ImportSource::PromobPdf => write!(f, "PROMOB_PDF"),
        }
    }
}

impl ImportSource {
    /// Converte a string do banco de volta para o enum
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PROMOB_PDF" => ImportSource::PromobPdf,
            _ => ImportSource::HaixunCsv, // padrão
        }
    }

    /// Converte para a string armazenada no banco
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ImportSource::HaixunCsv => "HAIXUN_CSV",
            ImportSource::PromobPdf => "PROMOB_PDF",
        }
    }
}

// ==========================================
// Severidade de ocorrência (Issue Severity)
// ==========================================
// Ordem: Warning < Error < Critical
// Warning: linha importada mesmo assim (com valor padrão)
// Error: linha excluída da importação, demais linhas seguem
// Critical: arquivo inteiro rejeitado
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Warning,
    Error,
    Critical,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Warning => write!(f, "WARNING"),
            IssueSeverity::Error => write!(f, "ERROR"),
            IssueSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// Tipo de ocorrência (Issue Kind)
// ==========================================
// Classificação fixa das falhas de validação por linha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    StructuralParse,       // linha ilegível para o parser
    MissingRequiredColumn, // linha com menos colunas que o mínimo
    InvalidBarcode,        // código de barras fora do formato
    DuplicateBarcode,      // código repetido (no arquivo ou no banco)
    InvalidMeasurement,    // medida não numérica ou negativa
    MissingClientInfo,     // cliente ausente
    Generic,               // falha não classificada
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::StructuralParse => write!(f, "STRUCTURAL_PARSE"),
            IssueKind::MissingRequiredColumn => write!(f, "MISSING_REQUIRED_COLUMN"),
            IssueKind::InvalidBarcode => write!(f, "INVALID_BARCODE"),
            IssueKind::DuplicateBarcode => write!(f, "DUPLICATE_BARCODE"),
            IssueKind::InvalidMeasurement => write!(f, "INVALID_MEASUREMENT"),
            IssueKind::MissingClientInfo => write!(f, "MISSING_CLIENT_INFO"),
            IssueKind::Generic => write!(f, "GENERIC"),
        }
    }
}

impl IssueKind {
    /// Severidade associada ao tipo de ocorrência
    ///
    /// MissingClientInfo depende da origem: no CSV o cliente é
    /// obrigatório (Error); nas etiquetas PDF ele pode faltar e a
    /// peça entra com o nome padrão (Warning).
    pub fn base_severity(&self, source: ImportSource) -> IssueSeverity {
        match self {
            IssueKind::StructuralParse => IssueSeverity::Critical,
            IssueKind::MissingRequiredColumn => IssueSeverity::Warning,
            IssueKind::InvalidBarcode => IssueSeverity::Error,
            IssueKind::DuplicateBarcode => IssueSeverity::Error,
            IssueKind::InvalidMeasurement => IssueSeverity::Warning,
            IssueKind::MissingClientInfo => match source {
                ImportSource::HaixunCsv => IssueSeverity::Error,
                ImportSource::PromobPdf => IssueSeverity::Warning,
            },
            IssueKind::Generic => IssueSeverity::Critical,
        }
    }
}

// ==========================================
// Status da peça (Piece Status)
// ==========================================
// Transição única: PENDING -> PRODUCED (nunca volta)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceStatus {
    Pending,  // aguardando produção
    Produced, // produzida (bipada no chão de fábrica)
}

impl fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceStatus::Pending => write!(f, "PENDING"),
            PieceStatus::Produced => write!(f, "PRODUCED"),
        }
    }
}

impl PieceStatus {
    /// Converte a string do banco de volta para o enum
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PRODUCED" => PieceStatus::Produced,
            _ => PieceStatus::Pending, // padrão
        }
    }

    /// Converte para a string armazenada no banco
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PieceStatus::Pending => "PENDING",
            PieceStatus::Produced => "PRODUCED",
        }
    }

    /// Interpreta um filtro vindo da interface
    ///
    /// Diferente de from_db_str, valor desconhecido é rejeitado
    /// (filtro digitado errado não pode virar PENDING em silêncio).
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(PieceStatus::Pending),
            "PRODUCED" => Some(PieceStatus::Produced),
            _ => None,
        }
    }
}

// ==========================================
// Status do volume (Volume Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeStatus {
    Open,    // em montagem, aceita peças
    Shipped, // expedido, fechado
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeStatus::Open => write!(f, "OPEN"),
            VolumeStatus::Shipped => write!(f, "SHIPPED"),
        }
    }
}

impl VolumeStatus {
    /// Converte a string do banco de volta para o enum
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SHIPPED" => VolumeStatus::Shipped,
            _ => VolumeStatus::Open, // padrão
        }
    }

    /// Converte para a string armazenada no banco
    pub fn to_db_str(&self) -> &'static str {
        match self {
            VolumeStatus::Open => "OPEN",
            VolumeStatus::Shipped => "SHIPPED",
        }
    }

    /// Interpreta um filtro vindo da interface
    ///
    /// Como em PieceStatus: valor desconhecido é rejeitado em vez de
    /// cair no padrão.
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(VolumeStatus::Open),
            "SHIPPED" => Some(VolumeStatus::Shipped),
            _ => None,
        }
    }
}
