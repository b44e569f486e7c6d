// ==========================================
// Marcenaria Track - Estado da aplicação
// ==========================================
// Responsabilidade: abrir o banco, garantir o bootstrap do
// workspace e montar as APIs sobre uma conexão compartilhada
// ==========================================

use anyhow::Context;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, PieceApi, ScanApi, VolumeApi, WarehouseApi};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::importer::{
    AggregatorImpl, DuplicateCheckerImpl, FieldValidatorImpl, HaixunCsvExtractor,
    LopdfTextExtractor, ManifestImporterImpl, PromobPdfExtractor,
};
use crate::repository::{
    PieceRepository, ProjectRepository, SqliteImportRepository, VolumeRepository,
    WarehouseRepository,
};

// ==========================================
// AppState
// ==========================================
// Todas as APIs compartilham a mesma conexão SQLite; o arquivo do
// banco é a única fonte de estado persistente.
pub struct AppState {
    /// Caminho do arquivo do banco
    pub db_path: String,

    /// Workspace desta instalação (gerado no primeiro uso)
    pub workspace_id: String,

    /// Importação de manifestos (CSV/PDF)
    pub import_api: Arc<ImportApi>,

    /// Bipagem de produção
    pub scan_api: Arc<ScanApi>,

    /// Cadastro de peças e projetos
    pub piece_api: Arc<PieceApi>,

    /// Volumes de expedição
    pub volume_api: Arc<VolumeApi>,

    /// Depósitos
    pub warehouse_api: Arc<WarehouseApi>,

    /// Configuração (locale, nome padrão de cliente)
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// Monta o estado completo da aplicação
    ///
    /// # Parâmetros
    /// - db_path: caminho do arquivo do banco
    ///
    /// # Regras
    /// - O schema é aplicado de forma idempotente a cada partida
    /// - O workspace id é gerado no primeiro uso e reaproveitado depois
    /// - O locale salvo na configuração é aplicado antes de montar as APIs
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        tracing::info!(db_path = %db_path, "inicializando AppState");

        // Conexão compartilhada + schema
        let conn = crate::db::open_sqlite_connection(db_path)
            .with_context(|| format!("não foi possível abrir o banco em {}", db_path))?;
        crate::db::init_schema(&conn).context("não foi possível aplicar o schema")?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Configuração e bootstrap do workspace
        // ==========================================
        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let workspace_id = config.ensure_workspace_id()?;

        let locale = config.get_locale()?;
        crate::i18n::set_locale(&locale);

        // ==========================================
        // Camada de repositórios (conexão compartilhada)
        // ==========================================
        let piece_repo = Arc::new(PieceRepository::from_connection(conn.clone()));
        let project_repo = Arc::new(ProjectRepository::from_connection(conn.clone()));
        let volume_repo = Arc::new(VolumeRepository::from_connection(conn.clone()));
        let warehouse_repo = Arc::new(WarehouseRepository::from_connection(conn.clone()));

        // ==========================================
        // Importador de manifestos
        // ==========================================
        // O nome padrão de cliente (etiquetas PDF sem cliente) vem da
        // configuração, pela mesma visão que o importador usa.
        let default_client_name = config.default_client_name().await?;
        let importer = Arc::new(ManifestImporterImpl::new(
            SqliteImportRepository::from_connection(conn.clone()),
            (*config).clone(),
            Box::new(HaixunCsvExtractor),
            Box::new(PromobPdfExtractor::new(Box::new(LopdfTextExtractor))),
            Box::new(FieldValidatorImpl::new(default_client_name)),
            Box::new(DuplicateCheckerImpl),
            Box::new(AggregatorImpl),
        ));

        // ==========================================
        // Camada de API
        // ==========================================
        let import_api = Arc::new(ImportApi::new(
            importer,
            SqliteImportRepository::from_connection(conn.clone()),
            workspace_id.clone(),
        ));
        let scan_api = Arc::new(ScanApi::new(piece_repo.clone(), workspace_id.clone()));
        let piece_api = Arc::new(PieceApi::new(
            piece_repo.clone(),
            project_repo,
            workspace_id.clone(),
        ));
        let volume_api = Arc::new(VolumeApi::new(
            volume_repo,
            piece_repo,
            warehouse_repo.clone(),
            workspace_id.clone(),
        ));
        let warehouse_api = Arc::new(WarehouseApi::new(warehouse_repo, workspace_id.clone()));

        tracing::info!(workspace_id = %workspace_id, locale = %locale, "AppState pronto");

        Ok(Self {
            db_path: db_path.to_string(),
            workspace_id,
            import_api,
            scan_api,
            piece_api,
            volume_api,
            warehouse_api,
            config,
        })
    }

    /// Caminho do arquivo do banco
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// Caminho padrão do banco
// ==========================================

/// Resolve o caminho padrão do arquivo do banco
///
/// # Retorno
/// - variável MARCENARIA_TRACK_DB_PATH, quando definida e não vazia
/// - diretório de dados do usuário (marcenaria-track-dev em debug,
///   marcenaria-track em release)
/// - ./marcenaria_track.db como último recurso
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MARCENARIA_TRACK_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./marcenaria_track.db");

    if let Some(data_dir) = dirs::data_dir() {
        // Em debug usa um diretório separado para não tocar nos dados reais
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("marcenaria-track-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("marcenaria-track");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("marcenaria_track.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_workspace_id_survives_restart() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        let db_path = db_path.to_str().unwrap();

        let first = AppState::new(db_path).await.unwrap();
        let first_ws = first.workspace_id.clone();
        assert!(!first_ws.is_empty());
        drop(first);

        // Segunda partida reaproveita o mesmo workspace
        let second = AppState::new(db_path).await.unwrap();
        assert_eq!(second.workspace_id, first_ws);
    }
}
