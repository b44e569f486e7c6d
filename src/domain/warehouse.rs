// ==========================================
// Marcenaria Track - Depósitos
// ==========================================
// Cadastro simples de locais de armazenagem dos volumes
// Alinhado a: scripts/schema.sql (tabela warehouse)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: String, // UUID
    pub workspace_id: String,
    pub name: String,
    pub active: bool, // desativado some das listas, mas volumes antigos mantêm o vínculo
    pub created_at: DateTime<Utc>,
}
