// ==========================================
// Marcenaria Track - Camada de importação
// ==========================================
// Responsabilidade: transformar manifestos externos (CSV da
// seccionadora, etiquetas PDF do Promob) em peças rastreáveis
// Fluxo: extração -> validação -> duplicidade -> prévia -> gravação
// ==========================================

// Declaração dos módulos
pub mod aggregator;
pub mod duplicate_checker;
pub mod error;
pub mod haixun_csv;
pub mod manifest_importer_impl;
pub mod manifest_importer_trait;
pub mod pdf_text;
pub mod promob_pdf;
pub mod validator;

// Reexporta os tipos centrais
pub use aggregator::Aggregator as AggregatorImpl;
pub use duplicate_checker::DuplicateChecker as DuplicateCheckerImpl;
pub use error::{ImportError, ImportResult};
pub use haixun_csv::HaixunCsvExtractor;
pub use manifest_importer_impl::ManifestImporterImpl;
pub use pdf_text::LopdfTextExtractor;
pub use promob_pdf::PromobPdfExtractor;
pub use validator::{issue_kind_for_field, FieldValidator as FieldValidatorImpl};

// Reexporta as interfaces
pub use manifest_importer_trait::{
    Aggregator, DuplicateChecker, Extraction, FieldValidator, ManifestImporter, PdfPageText,
    PdfTextExtractor, PositionedText, RowExtractor, RowValidation,
};
