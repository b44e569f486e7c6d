// ==========================================
// Marcenaria Track - Camada de configuração
// ==========================================
// Responsabilidade: configuração da aplicação (workspace, idioma,
// preferências de importação)
// Armazenamento: tabela config_kv
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// Reexporta o gerenciador central
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
