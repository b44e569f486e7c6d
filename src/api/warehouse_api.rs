// ==========================================
// Marcenaria Track - API de depósitos
// ==========================================
// Responsabilidade: cadastro dos locais de armazenagem
// ==========================================

use crate::api::error::{validate_required_text, ApiError, ApiResult};
use crate::domain::Warehouse;
use crate::repository::WarehouseRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ==========================================
// WarehouseApi
// ==========================================
pub struct WarehouseApi {
    warehouse_repo: Arc<WarehouseRepository>,
    workspace_id: String,
}

impl WarehouseApi {
    pub fn new(warehouse_repo: Arc<WarehouseRepository>, workspace_id: String) -> Self {
        Self {
            warehouse_repo,
            workspace_id,
        }
    }

    /// Cadastra um depósito ativo
    pub fn create_warehouse(&self, name: &str) -> ApiResult<Warehouse> {
        validate_required_text(name, "nome")?;

        let warehouse = Warehouse {
            warehouse_id: Uuid::new_v4().to_string(),
            workspace_id: self.workspace_id.clone(),
            name: name.trim().to_string(),
            active: true,
            created_at: Utc::now(),
        };
        self.warehouse_repo.insert_warehouse(&warehouse)?;
        info!(warehouse = %warehouse.name, "depósito cadastrado");
        Ok(warehouse)
    }

    /// Lista depósitos em ordem alfabética
    ///
    /// # Parâmetros
    /// - only_active: esconde os desativados quando true
    pub fn list_warehouses(&self, only_active: bool) -> ApiResult<Vec<Warehouse>> {
        Ok(self
            .warehouse_repo
            .list_warehouses(&self.workspace_id, only_active)?)
    }

    /// Ativa ou desativa um depósito
    ///
    /// Desativar não apaga nada: volumes antigos mantêm o vínculo,
    /// o depósito apenas some das listas de escolha.
    pub fn set_active(&self, warehouse_id: &str, active: bool) -> ApiResult<()> {
        validate_required_text(warehouse_id, "warehouse_id")?;
        let changed = self
            .warehouse_repo
            .set_active(&self.workspace_id, warehouse_id, active)?;
        if !changed {
            return Err(ApiError::NotFound(format!("depósito (id={})", warehouse_id)));
        }
        info!(warehouse = %warehouse_id, active, "depósito atualizado");
        Ok(())
    }

    /// Renomeia um depósito
    pub fn rename(&self, warehouse_id: &str, name: &str) -> ApiResult<()> {
        validate_required_text(warehouse_id, "warehouse_id")?;
        validate_required_text(name, "nome")?;
        let changed = self
            .warehouse_repo
            .rename(&self.workspace_id, warehouse_id, name.trim())?;
        if !changed {
            return Err(ApiError::NotFound(format!("depósito (id={})", warehouse_id)));
        }
        Ok(())
    }
}
