// ==========================================
// Marcenaria Track - API de volumes
// ==========================================
// Responsabilidade: montagem e expedição de volumes
// (criar, bipar peças para dentro, listar, expedir)
// ==========================================

use crate::api::error::{validate_required_text, ApiError, ApiResult};
use crate::domain::{Piece, Volume, VolumeStatus, VolumeSummary};
use crate::i18n::t_with_args;
use crate::repository::{PieceRepository, VolumeRepository, WarehouseRepository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Volume com a mensagem de confirmação já localizada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub volume: Volume,
    pub message: String,
}

// ==========================================
// VolumeApi
// ==========================================
// A bipagem para dentro do volume resolve a peça pelo código de
// barras; o vínculo em si fica no VolumeRepository.
pub struct VolumeApi {
    volume_repo: Arc<VolumeRepository>,
    piece_repo: Arc<PieceRepository>,
    warehouse_repo: Arc<WarehouseRepository>,
    workspace_id: String,
}

impl VolumeApi {
    pub fn new(
        volume_repo: Arc<VolumeRepository>,
        piece_repo: Arc<PieceRepository>,
        warehouse_repo: Arc<WarehouseRepository>,
        workspace_id: String,
    ) -> Self {
        Self {
            volume_repo,
            piece_repo,
            warehouse_repo,
            workspace_id,
        }
    }

    /// Cria um volume aberto
    ///
    /// # Parâmetros
    /// - code: código impresso na etiqueta do volume
    /// - client_name: cliente de destino
    /// - warehouse_id: depósito onde o volume aguarda (opcional)
    ///
    /// # Regras
    /// - O depósito, quando informado, precisa existir e estar ativo
    pub fn create_volume(
        &self,
        code: &str,
        client_name: &str,
        warehouse_id: Option<&str>,
    ) -> ApiResult<VolumeResponse> {
        validate_required_text(code, "codigo")?;
        validate_required_text(client_name, "cliente")?;

        if let Some(warehouse_id) = warehouse_id {
            let warehouse = self
                .warehouse_repo
                .get_warehouse(&self.workspace_id, warehouse_id)?
                .ok_or_else(|| ApiError::NotFound(format!("depósito (id={})", warehouse_id)))?;
            if !warehouse.active {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "depósito {} está desativado",
                    warehouse.name
                )));
            }
        }

        let volume = Volume {
            volume_id: Uuid::new_v4().to_string(),
            workspace_id: self.workspace_id.clone(),
            code: code.trim().to_string(),
            client_name: client_name.trim().to_string(),
            warehouse_id: warehouse_id.map(|id| id.to_string()),
            status: VolumeStatus::Open,
            created_at: Utc::now(),
            shipped_at: None,
        };
        self.volume_repo.insert_volume(&volume)?;
        info!(volume = %volume.code, client = %volume.client_name, "volume criado");

        let message = t_with_args("volume.created", &[("code", volume.code.as_str())]);
        Ok(VolumeResponse { volume, message })
    }

    /// Lista volumes do workspace com contagem de peças
    ///
    /// # Parâmetros
    /// - status: "OPEN" ou "SHIPPED"; outro valor é rejeitado
    pub fn list_volumes(&self, status: Option<&str>) -> ApiResult<Vec<VolumeSummary>> {
        let status = match status {
            Some(raw) => Some(VolumeStatus::parse_filter(raw).ok_or_else(|| {
                ApiError::InvalidInput(format!("filtro de status desconhecido: {}", raw))
            })?),
            None => None,
        };
        Ok(self.volume_repo.list_volumes(&self.workspace_id, status)?)
    }

    /// Busca um volume pelo id
    pub fn get_volume(&self, volume_id: &str) -> ApiResult<Volume> {
        validate_required_text(volume_id, "volume_id")?;
        self.volume_repo
            .get_volume(&self.workspace_id, volume_id)?
            .ok_or_else(|| ApiError::NotFound(format!("volume (id={})", volume_id)))
    }

    /// Bipa uma peça para dentro do volume
    ///
    /// Se a peça estava em outro volume, o vínculo anterior é
    /// substituído (uma peça pertence a no máximo um volume).
    ///
    /// # Parâmetros
    /// - volume_id: volume de destino (precisa estar aberto)
    /// - barcode: código de barras da peça
    pub fn add_piece_by_barcode(&self, volume_id: &str, barcode: &str) -> ApiResult<Piece> {
        validate_required_text(volume_id, "volume_id")?;
        validate_required_text(barcode, "codigo")?;

        let piece = self
            .piece_repo
            .find_by_barcode(&self.workspace_id, barcode)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("peça com código {}", barcode.trim().to_uppercase()))
            })?;

        self.volume_repo
            .add_piece(&self.workspace_id, volume_id, &piece.piece_id)?;
        info!(volume = %volume_id, barcode = %piece.barcode, "peça adicionada ao volume");
        Ok(piece)
    }

    /// Remove uma peça do volume (a peça continua no cadastro)
    pub fn remove_piece(&self, volume_id: &str, piece_id: &str) -> ApiResult<()> {
        validate_required_text(volume_id, "volume_id")?;
        validate_required_text(piece_id, "piece_id")?;

        let removed = self
            .volume_repo
            .remove_piece(&self.workspace_id, volume_id, piece_id)?;
        if !removed {
            return Err(ApiError::NotFound(format!(
                "peça (id={}) no volume {}",
                piece_id, volume_id
            )));
        }
        Ok(())
    }

    /// Lista as peças de um volume na ordem de bipagem
    pub fn list_volume_pieces(&self, volume_id: &str) -> ApiResult<Vec<Piece>> {
        validate_required_text(volume_id, "volume_id")?;
        Ok(self
            .volume_repo
            .list_volume_pieces(&self.workspace_id, volume_id)?)
    }

    /// Marca o volume como expedido
    ///
    /// Depois de expedido o volume não aceita mais peças; expedir de
    /// novo é uma transição inválida.
    pub fn mark_shipped(&self, volume_id: &str) -> ApiResult<VolumeResponse> {
        validate_required_text(volume_id, "volume_id")?;

        let volume = self.volume_repo.mark_shipped(&self.workspace_id, volume_id)?;
        info!(volume = %volume.code, "volume expedido");

        let message = t_with_args("volume.shipped", &[("code", volume.code.as_str())]);
        Ok(VolumeResponse { volume, message })
    }

    /// Remove um volume; os vínculos caem e as peças ficam no cadastro
    pub fn delete_volume(&self, volume_id: &str) -> ApiResult<()> {
        validate_required_text(volume_id, "volume_id")?;
        let removed = self
            .volume_repo
            .delete_volume(&self.workspace_id, volume_id)?;
        if !removed {
            return Err(ApiError::NotFound(format!("volume (id={})", volume_id)));
        }
        info!(volume = %volume_id, "volume removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{piece_id, Warehouse};
    use rusqlite::{params, Connection};
    use std::sync::Mutex;

    const WS: &str = "WS-VOL";

    fn setup() -> (Arc<Mutex<Connection>>, VolumeApi) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let api = VolumeApi::new(
            Arc::new(VolumeRepository::from_connection(conn.clone())),
            Arc::new(PieceRepository::from_connection(conn.clone())),
            Arc::new(WarehouseRepository::from_connection(conn.clone())),
            WS.to_string(),
        );
        (conn, api)
    }

    fn seed_piece(conn: &Arc<Mutex<Connection>>, barcode: &str) {
        let now = Utc::now().to_rfc3339();
        let guard = conn.lock().unwrap();
        guard
            .execute(
                r#"
                INSERT INTO piece (
                    piece_id, workspace_id, barcode, piece_name, piece_module,
                    project_id, project_name, client_code, client_name,
                    dimensions, material, color, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, 'Lateral', 'Mod A', 'PRJ', 'Cozinha-A',
                          'C001', 'Acme', '500 x 300 x 18', 'MDF', 'Branco',
                          'PRODUCED', ?4, ?4)
                "#,
                params![piece_id(WS, barcode), WS, barcode, now],
            )
            .unwrap();
    }

    #[test]
    fn test_create_scan_and_ship_flow() {
        let (conn, api) = setup();
        seed_piece(&conn, "BC1");
        seed_piece(&conn, "BC2");

        let created = api.create_volume("VOL-01", "Acme Móveis", None).unwrap();
        assert_eq!(created.volume.status, VolumeStatus::Open);
        assert!(created.message.contains("VOL-01"));
        let volume_id = created.volume.volume_id.clone();

        // Bipagem resolve pelo código, inclusive fora de caixa
        api.add_piece_by_barcode(&volume_id, "bc1").unwrap();
        api.add_piece_by_barcode(&volume_id, "BC2").unwrap();
        assert_eq!(api.list_volume_pieces(&volume_id).unwrap().len(), 2);

        let shipped = api.mark_shipped(&volume_id).unwrap();
        assert_eq!(shipped.volume.status, VolumeStatus::Shipped);
        assert!(shipped.volume.shipped_at.is_some());

        // Volume expedido não aceita mais peças
        seed_piece(&conn, "BC3");
        let err = api.add_piece_by_barcode(&volume_id, "BC3").unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_add_unknown_barcode() {
        let (_conn, api) = setup();
        let created = api.create_volume("VOL-02", "Acme", None).unwrap();

        let err = api
            .add_piece_by_barcode(&created.volume.volume_id, "zz999")
            .unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("ZZ999")),
            other => panic!("esperava NotFound, veio {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_active_warehouse() {
        let (_conn, api) = setup();

        // Depósito inexistente
        let err = api
            .create_volume("VOL-03", "Acme", Some("W-404"))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Depósito desativado
        let warehouse = Warehouse {
            warehouse_id: "W-1".to_string(),
            workspace_id: WS.to_string(),
            name: "Galpão B".to_string(),
            active: false,
            created_at: Utc::now(),
        };
        api.warehouse_repo.insert_warehouse(&warehouse).unwrap();
        let err = api
            .create_volume("VOL-03", "Acme", Some("W-1"))
            .unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_unknown_status_filter_is_rejected() {
        let (_conn, api) = setup();
        assert!(api.list_volumes(Some("CLOSED")).is_err());
        assert!(api.list_volumes(Some("open")).is_ok());
    }
}
