// ==========================================
// Marcenaria Track - API de importação
// ==========================================
// Responsabilidade: fachada da importação para a interface
// (análise, conferência, confirmação e histórico de lotes)
// ==========================================

use crate::api::error::{validate_required_text, ApiResult};
use crate::config::ConfigManager;
use crate::domain::{AnalyzeReport, CommitReport, ImportBatch, RecordEdit, StagedRecord};
use crate::importer::{ManifestImporter, ManifestImporterImpl};
use crate::repository::{ImportRepository, SqliteImportRepository};
use std::sync::Arc;
use tracing::info;

/// Importador concreto montado pela aplicação
pub type AppManifestImporter = ManifestImporterImpl<SqliteImportRepository, ConfigManager>;

/// Limite padrão do histórico de lotes
const DEFAULT_BATCH_LIMIT: usize = 50;

// ==========================================
// ImportApi
// ==========================================
// O importador é compartilhado (Arc) porque o lote preparado vive
// em memória entre a análise e a confirmação.
pub struct ImportApi {
    importer: Arc<AppManifestImporter>,
    import_repo: SqliteImportRepository,
    workspace_id: String,
}

impl ImportApi {
    pub fn new(
        importer: Arc<AppManifestImporter>,
        import_repo: SqliteImportRepository,
        workspace_id: String,
    ) -> Self {
        Self {
            importer,
            import_repo,
            workspace_id,
        }
    }

    /// Analisa um manifesto (CSV ou PDF) e prepara o lote para conferência
    ///
    /// # Retorno
    /// - Ok(Some(relatório)): lote preparado aguardando confirmação
    /// - Ok(None): outra operação de importação em andamento
    pub async fn analyze_manifest(&self, file_path: &str) -> ApiResult<Option<AnalyzeReport>> {
        validate_required_text(file_path, "arquivo")?;
        info!(file = %file_path, "análise de manifesto solicitada");
        Ok(self.importer.analyze(file_path).await?)
    }

    /// Confirma o lote preparado e grava projetos e peças no cadastro
    ///
    /// Em caso de erro de gravação o lote preparado é preservado,
    /// então o operador pode confirmar de novo sem reanalisar.
    pub async fn confirm_import(&self, operator: &str) -> ApiResult<Option<CommitReport>> {
        validate_required_text(operator, "operador")?;
        Ok(self.importer.confirm(operator.trim()).await?)
    }

    /// Descarta o lote preparado sem gravar nada
    ///
    /// # Retorno
    /// - true: havia lote preparado e foi descartado
    pub fn cancel_import(&self) -> bool {
        self.importer.cancel()
    }

    /// Fotografia do lote preparado (reabre a tela de conferência)
    pub fn staged_report(&self) -> Option<AnalyzeReport> {
        self.importer.staged()
    }

    /// Corrige uma linha do lote preparado e revalida
    ///
    /// # Parâmetros
    /// - index: posição da linha dentro do lote
    /// - edit: campos a substituir (None mantém o valor atual)
    pub fn update_record(&self, index: usize, edit: RecordEdit) -> ApiResult<Option<StagedRecord>> {
        Ok(self.importer.update_staged_record(index, edit)?)
    }

    /// Histórico dos lotes importados, mais recentes primeiro
    ///
    /// # Parâmetros
    /// - limit: quantidade máxima de lotes (0 usa o padrão)
    pub async fn list_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let limit = if limit == 0 { DEFAULT_BATCH_LIMIT } else { limit };
        Ok(self
            .import_repo
            .list_batches(&self.workspace_id, limit)
            .await?)
    }
}
