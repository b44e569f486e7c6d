// ==========================================
// Marcenaria Track - Camada de domínio
// ==========================================
// Responsabilidade: entidades, tipos e regras de identidade
// Restrição: sem acesso a dados, sem lógica de pipeline
// ==========================================

pub mod import;
pub mod piece;
pub mod types;
pub mod volume;
pub mod warehouse;

// Reexporta os tipos centrais
pub use import::{
    AnalyzeReport, ClientPreviewGroup, CommitReport, ImportBatch, ImportIssue, ImportRecord,
    ProjectPreview, RawPieceRow, RecordEdit, RowLocator, StagedRecord,
};
pub use piece::{normalize_barcode, piece_id, project_id, Piece, Project, ScanOutcome, StatusSummary};
pub use types::{ImportSource, IssueKind, IssueSeverity, PieceStatus, VolumeStatus};
pub use volume::{Volume, VolumeSummary};
pub use warehouse::Warehouse;
