// ==========================================
// Marcenaria Track - biblioteca principal
// ==========================================
// Rastreamento de chão de fábrica para marcenaria:
// importação de manifestos (Haixun CSV / Promob PDF),
// bipagem de peças, volumes de expedição e galpões.
// ==========================================

// Inicializa o sistema de internacionalização
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// Declaração de módulos
// ==========================================

// Camada de domínio - entidades e tipos
pub mod domain;

// Camada de repositórios - acesso a dados
pub mod repository;

// Camada de importação - manifestos externos
pub mod importer;

// Camada de configuração
pub mod config;

// Infraestrutura de banco (inicialização de conexão / PRAGMA unificado)
pub mod db;

// Sistema de logs
pub mod logging;

// Internacionalização
pub mod i18n;

// Camada de API - interfaces de negócio
pub mod api;

// Camada de aplicação - estado compartilhado
pub mod app;

// ==========================================
// Reexportação de tipos centrais
// ==========================================

// Tipos de domínio
pub use domain::types::{ImportSource, IssueKind, IssueSeverity, PieceStatus, VolumeStatus};

// Entidades de domínio
pub use domain::{
    ClientPreviewGroup, ImportBatch, ImportIssue, ImportRecord, Piece, Project, RawPieceRow,
    RowLocator, ScanOutcome, Volume, Warehouse,
};

// API
pub use api::{ImportApi, PieceApi, ScanApi, VolumeApi, WarehouseApi};

// ==========================================
// Constantes do sistema
// ==========================================

// Versão do sistema
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Nome do sistema
pub const APP_NAME: &str = "Marcenaria Track";

// Versão do banco de dados
pub const DB_VERSION: &str = "v0.1";
