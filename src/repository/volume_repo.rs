// ==========================================
// Marcenaria Track - Repository de volumes
// ==========================================
// Responsabilidade: CRUD das tabelas volume e volume_piece
// Regras locais: só volume OPEN recebe peça; expedição é transição
// condicional OPEN -> SHIPPED
// ==========================================

use crate::domain::{Piece, Volume, VolumeStatus, VolumeSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

/// Interpreta um timestamp rfc3339 vindo do banco
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn map_volume_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Volume> {
    let status_raw: String = row.get(5)?;
    let created_at_raw: String = row.get(6)?;
    let shipped_at_raw: Option<String> = row.get(7)?;
    Ok(Volume {
        volume_id: row.get(0)?,
        workspace_id: row.get(1)?,
        code: row.get(2)?,
        client_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        warehouse_id: row.get(4)?,
        status: VolumeStatus::from_db_str(&status_raw),
        created_at: parse_timestamp(&created_at_raw),
        shipped_at: shipped_at_raw.map(|raw| parse_timestamp(&raw)),
    })
}

const VOLUME_COLUMNS: &str =
    "volume_id, workspace_id, code, client_name, warehouse_id, status, created_at, shipped_at";

// ==========================================
// VolumeRepository - Repositório de volumes
// ==========================================
pub struct VolumeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VolumeRepository {
    /// Cria um repositório com conexão própria
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Cria um repositório sobre uma conexão compartilhada
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Obtém a conexão com a trava
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn find_volume(
        conn: &Connection,
        workspace_id: &str,
        volume_id: &str,
    ) -> RepositoryResult<Option<Volume>> {
        let sql = format!(
            "SELECT {} FROM volume WHERE volume_id = ?1 AND workspace_id = ?2",
            VOLUME_COLUMNS
        );
        let volume = conn
            .query_row(&sql, params![volume_id, workspace_id], map_volume_row)
            .optional()?;
        Ok(volume)
    }

    /// Insere um volume novo
    pub fn insert_volume(&self, volume: &Volume) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO volume (volume_id, workspace_id, code, client_name,
                                warehouse_id, status, created_at, shipped_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                volume.volume_id,
                volume.workspace_id,
                volume.code,
                volume.client_name,
                volume.warehouse_id,
                volume.status.to_db_str(),
                volume.created_at.to_rfc3339(),
                volume.shipped_at.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Busca um volume pelo id
    pub fn get_volume(
        &self,
        workspace_id: &str,
        volume_id: &str,
    ) -> RepositoryResult<Option<Volume>> {
        let conn = self.get_conn()?;
        Self::find_volume(&conn, workspace_id, volume_id)
    }

    /// Lista os volumes do workspace com contagem de peças
    ///
    /// # Parâmetros
    /// - status: filtra por OPEN/SHIPPED quando informado
    pub fn list_volumes(
        &self,
        workspace_id: &str,
        status: Option<VolumeStatus>,
    ) -> RepositoryResult<Vec<VolumeSummary>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            r#"
            SELECT {}, COUNT(vp.piece_id)
            FROM volume v
            LEFT JOIN volume_piece vp ON vp.volume_id = v.volume_id
            WHERE v.workspace_id = ?1
            "#,
            VOLUME_COLUMNS
                .split(", ")
                .map(|c| format!("v.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut values: Vec<String> = vec![workspace_id.to_string()];
        if let Some(status) = status {
            values.push(status.to_db_str().to_string());
            sql.push_str(" AND v.status = ?2");
        }
        sql.push_str(" GROUP BY v.volume_id ORDER BY v.created_at DESC, v.volume_id");

        let mut stmt = conn.prepare(&sql)?;
        let volumes = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                let volume = map_volume_row(row)?;
                Ok(VolumeSummary {
                    volume,
                    piece_count: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(volumes)
    }

    /// Coloca uma peça dentro de um volume
    ///
    /// volume_piece tem a peça como chave primária: se ela estava em
    /// outro volume, o INSERT OR REPLACE move o vínculo.
    ///
    /// # Regras
    /// - O volume precisa existir e estar OPEN
    /// - A peça precisa existir no mesmo workspace
    pub fn add_piece(
        &self,
        workspace_id: &str,
        volume_id: &str,
        piece_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let volume = Self::find_volume(&tx, workspace_id, volume_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "volume".to_string(),
                id: volume_id.to_string(),
            }
        })?;
        if volume.status != VolumeStatus::Open {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "volume {} já foi expedido; não recebe mais peças",
                volume.code
            )));
        }

        let piece_exists: bool = tx
            .query_row(
                "SELECT 1 FROM piece WHERE piece_id = ?1 AND workspace_id = ?2",
                params![piece_id, workspace_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !piece_exists {
            return Err(RepositoryError::NotFound {
                entity: "piece".to_string(),
                id: piece_id.to_string(),
            });
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO volume_piece (piece_id, volume_id, added_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![piece_id, volume_id, Utc::now().to_rfc3339()],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// Tira uma peça de um volume
    ///
    /// # Retorno
    /// - Ok(true): vínculo removido
    /// - Ok(false): a peça não estava neste volume
    pub fn remove_piece(
        &self,
        workspace_id: &str,
        volume_id: &str,
        piece_id: &str,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            DELETE FROM volume_piece
            WHERE piece_id = ?1 AND volume_id = ?2
              AND volume_id IN (SELECT volume_id FROM volume WHERE workspace_id = ?3)
            "#,
            params![piece_id, volume_id, workspace_id],
        )?;
        Ok(changed > 0)
    }

    /// Lista as peças dentro de um volume
    pub fn list_volume_pieces(
        &self,
        workspace_id: &str,
        volume_id: &str,
    ) -> RepositoryResult<Vec<Piece>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT p.piece_id, p.workspace_id, p.barcode, p.piece_name, p.piece_module,
                   p.project_id, p.project_name, p.client_code, p.client_name,
                   p.dimensions, p.material, p.color, p.status, p.produced_at,
                   p.produced_by, p.created_at, p.updated_at
            FROM piece p
            JOIN volume_piece vp ON vp.piece_id = p.piece_id
            WHERE vp.volume_id = ?1 AND p.workspace_id = ?2
            ORDER BY vp.added_at, p.piece_id
            "#,
        )?;

        let pieces = stmt
            .query_map(params![volume_id, workspace_id], |row| {
                use crate::domain::PieceStatus;
                let status_raw: String = row.get(12)?;
                let produced_at_raw: Option<String> = row.get(13)?;
                let created_at_raw: String = row.get(15)?;
                let updated_at_raw: String = row.get(16)?;
                Ok(Piece {
                    piece_id: row.get(0)?,
                    workspace_id: row.get(1)?,
                    barcode: row.get(2)?,
                    piece_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    piece_module: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    project_id: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    project_name: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    client_code: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    client_name: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    dimensions: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                    material: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    color: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
                    status: PieceStatus::from_db_str(&status_raw),
                    produced_at: produced_at_raw.map(|raw| parse_timestamp(&raw)),
                    produced_by: row.get(14)?,
                    created_at: parse_timestamp(&created_at_raw),
                    updated_at: parse_timestamp(&updated_at_raw),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pieces)
    }

    /// Expede o volume: transição condicional OPEN -> SHIPPED
    ///
    /// # Retorno
    /// - Ok(Volume): volume atualizado
    /// - Err(NotFound): volume inexistente
    /// - Err(InvalidStateTransition): já estava expedido
    pub fn mark_shipped(&self, workspace_id: &str, volume_id: &str) -> RepositoryResult<Volume> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let volume = Self::find_volume(&tx, workspace_id, volume_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "volume".to_string(),
                id: volume_id.to_string(),
            }
        })?;
        if volume.status != VolumeStatus::Open {
            return Err(RepositoryError::InvalidStateTransition {
                from: volume.status.to_db_str().to_string(),
                to: VolumeStatus::Shipped.to_db_str().to_string(),
            });
        }

        let now = Utc::now();
        tx.execute(
            r#"
            UPDATE volume SET status = 'SHIPPED', shipped_at = ?1
            WHERE volume_id = ?2 AND workspace_id = ?3 AND status = 'OPEN'
            "#,
            params![now.to_rfc3339(), volume_id, workspace_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut shipped = volume;
        shipped.status = VolumeStatus::Shipped;
        shipped.shipped_at = Some(now);
        Ok(shipped)
    }

    /// Remove um volume; os vínculos caem pelo CASCADE
    ///
    /// # Retorno
    /// - Ok(true): volume removido
    /// - Ok(false): volume não existia
    pub fn delete_volume(&self, workspace_id: &str, volume_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "DELETE FROM volume WHERE volume_id = ?1 AND workspace_id = ?2",
            params![volume_id, workspace_id],
        )?;
        Ok(changed > 0)
    }
}
