// ==========================================
// Marcenaria Track - Camada de repositórios
// ==========================================
// Responsabilidade: acesso a dados, escondendo os detalhes do SQLite
// Restrição: repository não carrega regra de negócio; toda consulta
// é parametrizada
// ==========================================

pub mod error;
pub mod import_repo;
pub mod import_repo_impl;
pub mod piece_repo;
pub mod project_repo;
pub mod volume_repo;
pub mod warehouse_repo;

// Reexporta os repositórios centrais
pub use error::{RepositoryError, RepositoryResult};
pub use import_repo::{CommitStats, ImportRepository};
pub use import_repo_impl::SqliteImportRepository;
pub use piece_repo::PieceRepository;
pub use project_repo::ProjectRepository;
pub use volume_repo::VolumeRepository;
pub use warehouse_repo::WarehouseRepository;
