// ==========================================
// Marcenaria Track - Volumes de expedição
// ==========================================
// Volume = caixa/pacote montado com peças produzidas
// Alinhado a: scripts/schema.sql (tabelas volume e volume_piece)
// ==========================================

use crate::domain::types::VolumeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Volume - Unidade de expedição
// ==========================================
// Uma peça pertence a no máximo um volume; mover a peça para outro
// volume remove o vínculo anterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub volume_id: String,             // UUID
    pub workspace_id: String,
    pub code: String,                  // código impresso na etiqueta do volume
    pub client_name: String,           // cliente de destino
    pub warehouse_id: Option<String>,  // depósito onde o volume aguarda
    pub status: VolumeStatus,          // OPEN ou SHIPPED
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
}

// ==========================================
// VolumeSummary - Volume com contagem de peças
// ==========================================
// Linha da listagem de volumes (JOIN com volume_piece)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub volume: Volume,
    pub piece_count: i64,
}
