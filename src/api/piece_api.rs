// ==========================================
// Marcenaria Track - API de peças e projetos
// ==========================================
// Responsabilidade: consultas e administração do cadastro
// (listagem com filtros, painel de acompanhamento, exclusões)
// ==========================================

use crate::api::error::{validate_required_text, ApiError, ApiResult};
use crate::domain::{Piece, PieceStatus, Project, StatusSummary};
use crate::repository::{PieceRepository, ProjectRepository};
use std::sync::Arc;
use tracing::info;

// ==========================================
// PieceApi
// ==========================================
pub struct PieceApi {
    piece_repo: Arc<PieceRepository>,
    project_repo: Arc<ProjectRepository>,
    workspace_id: String,
}

impl PieceApi {
    pub fn new(
        piece_repo: Arc<PieceRepository>,
        project_repo: Arc<ProjectRepository>,
        workspace_id: String,
    ) -> Self {
        Self {
            piece_repo,
            project_repo,
            workspace_id,
        }
    }

    // ===== Peças =====

    /// Lista peças do workspace com filtros opcionais
    ///
    /// # Parâmetros
    /// - status: "PENDING" ou "PRODUCED" (qualquer caixa); outro valor
    ///   é rejeitado em vez de cair num padrão silencioso
    /// - project_id: restringe a um projeto
    /// - search: busca parcial em código, nome da peça e cliente
    pub fn list_pieces(
        &self,
        status: Option<&str>,
        project_id: Option<&str>,
        search: Option<&str>,
    ) -> ApiResult<Vec<Piece>> {
        let status = match status {
            Some(raw) => Some(PieceStatus::parse_filter(raw).ok_or_else(|| {
                ApiError::InvalidInput(format!("filtro de status desconhecido: {}", raw))
            })?),
            None => None,
        };
        Ok(self
            .piece_repo
            .list_pieces(&self.workspace_id, status, project_id, search)?)
    }

    /// Busca uma peça pelo id
    pub fn get_piece(&self, piece_id: &str) -> ApiResult<Piece> {
        validate_required_text(piece_id, "piece_id")?;
        self.piece_repo
            .get_piece(&self.workspace_id, piece_id)?
            .ok_or_else(|| ApiError::NotFound(format!("peça (id={})", piece_id)))
    }

    /// Remove uma peça do cadastro
    ///
    /// O vínculo com volume (se houver) cai junto.
    pub fn delete_piece(&self, piece_id: &str) -> ApiResult<()> {
        validate_required_text(piece_id, "piece_id")?;
        let removed = self.piece_repo.delete_piece(&self.workspace_id, piece_id)?;
        if !removed {
            return Err(ApiError::NotFound(format!("peça (id={})", piece_id)));
        }
        info!(piece = %piece_id, "peça removida do cadastro");
        Ok(())
    }

    /// Painel de acompanhamento: totais por status
    ///
    /// # Parâmetros
    /// - project_id: restringe o resumo a um projeto quando informado
    pub fn status_summary(&self, project_id: Option<&str>) -> ApiResult<StatusSummary> {
        Ok(self
            .piece_repo
            .status_summary(&self.workspace_id, project_id)?)
    }

    // ===== Projetos =====

    /// Lista os projetos do workspace
    pub fn list_projects(&self) -> ApiResult<Vec<Project>> {
        Ok(self.project_repo.list_projects(&self.workspace_id)?)
    }

    /// Busca um projeto pelo id
    pub fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        validate_required_text(project_id, "project_id")?;
        self.project_repo
            .get_project(&self.workspace_id, project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("projeto (id={})", project_id)))
    }

    /// Remove um projeto e todas as suas peças
    ///
    /// As peças caem na mesma transação: o vínculo peça -> projeto é
    /// lógico, não há CASCADE no schema para essa relação.
    pub fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        validate_required_text(project_id, "project_id")?;
        let removed = self
            .project_repo
            .delete_project(&self.workspace_id, project_id)?;
        if !removed {
            return Err(ApiError::NotFound(format!("projeto (id={})", project_id)));
        }
        info!(project = %project_id, "projeto e peças removidos");
        Ok(())
    }
}
