// ==========================================
// Marcenaria Track - Camada de API
// ==========================================
// Responsabilidade: fachadas de negócio consumidas pela interface
// e pelos binários de linha de comando
// ==========================================

pub mod error;
pub mod import_api;
pub mod piece_api;
pub mod scan_api;
pub mod volume_api;
pub mod warehouse_api;

// Reexporta os tipos centrais
pub use error::{validate_required_text, ApiError, ApiResult};
pub use import_api::{AppManifestImporter, ImportApi};
pub use piece_api::PieceApi;
pub use scan_api::{ScanApi, ScanResponse};
pub use volume_api::{VolumeApi, VolumeResponse};
pub use warehouse_api::WarehouseApi;
