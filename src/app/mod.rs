// ==========================================
// Marcenaria Track - Camada de aplicação
// ==========================================
// Responsabilidade: montagem do estado e resolução do banco
// ==========================================

pub mod state;

// Reexporta
pub use state::{get_default_db_path, AppState};
