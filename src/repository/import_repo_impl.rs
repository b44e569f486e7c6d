// ==========================================
// Marcenaria Track - Repository da importação (implementação)
// ==========================================
// Responsabilidade: gravação e consulta do lote confirmado (rusqlite)
// Linha vermelha: Repository só faz CRUD; decisão fica no importador
// ==========================================

use crate::domain::{ImportBatch, ImportSource, Piece, PieceStatus, Project};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo::{CommitStats, ImportRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Interpreta um timestamp rfc3339 vindo do banco
///
/// Valor ilegível cai no momento atual em vez de derrubar a leitura
/// inteira (registro antigo não pode travar a listagem).
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ==========================================
// SqliteImportRepository
// ==========================================
pub struct SqliteImportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteImportRepository {
    /// Cria um repositório com conexão própria
    ///
    /// # Parâmetros
    /// - db_path: caminho do arquivo do banco
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

    /// Upsert de projetos dentro da transação
    ///
    /// ON CONFLICT DO UPDATE preserva created_at e o status atual do
    /// projeto; só os dados descritivos acompanham a reimportação.
    fn upsert_projects_tx(tx: &Transaction, projects: &[Project]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO project (
                project_id, workspace_id, name, client_name, client_code,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(project_id) DO UPDATE SET
                name = excluded.name,
                client_name = excluded.client_name,
                client_code = excluded.client_code,
                updated_at = excluded.updated_at
            "#,
        )?;

        let mut count = 0;
        for project in projects {
            stmt.execute(params![
                project.project_id,
                project.workspace_id,
                project.name,
                project.client_name,
                project.client_code,
                project.status,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// Upsert de peças dentro da transação
    ///
    /// Não usa INSERT OR REPLACE: o REPLACE apaga e reinsere a linha,
    /// e o ON DELETE CASCADE de volume_piece levaria junto o vínculo
    /// da peça com o volume. O DO UPDATE também preserva created_at.
    /// Reimportar devolve a peça para PENDING e zera a produção.
    fn upsert_pieces_tx(tx: &Transaction, pieces: &[Piece]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO piece (
                piece_id, workspace_id, barcode, piece_name, piece_module,
                project_id, project_name, client_code, client_name,
                dimensions, material, color, status, produced_at, produced_by,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
            )
            ON CONFLICT(piece_id) DO UPDATE SET
                barcode = excluded.barcode,
                piece_name = excluded.piece_name,
                piece_module = excluded.piece_module,
                project_id = excluded.project_id,
                project_name = excluded.project_name,
                client_code = excluded.client_code,
                client_name = excluded.client_name,
                dimensions = excluded.dimensions,
                material = excluded.material,
                color = excluded.color,
                status = excluded.status,
                produced_at = NULL,
                produced_by = NULL,
                updated_at = excluded.updated_at
            "#,
        )?;

        let mut count = 0;
        for piece in pieces {
            stmt.execute(params![
                piece.piece_id,
                piece.workspace_id,
                piece.barcode,
                piece.piece_name,
                piece.piece_module,
                piece.project_id,
                piece.project_name,
                piece.client_code,
                piece.client_name,
                piece.dimensions,
                piece.material,
                piece.color,
                piece.status.to_db_str(),
                piece.produced_at.map(|d| d.to_rfc3339()),
                piece.produced_by,
                piece.created_at.to_rfc3339(),
                piece.updated_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// Insere o registro de auditoria do lote dentro da transação
    fn insert_batch_tx(tx: &Transaction, batch: &ImportBatch) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, workspace_id, source, file_name, total_rows,
                valid_rows, skipped_rows, error_count, warning_count,
                committed_at, committed_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.workspace_id,
                batch.source.to_db_str(),
                batch.file_name,
                batch.total_rows,
                batch.valid_rows,
                batch.skipped_rows,
                batch.error_count,
                batch.warning_count,
                batch
                    .committed_at
                    .unwrap_or_else(Utc::now)
                    .to_rfc3339(),
                batch.committed_by,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ImportRepository for SqliteImportRepository {
    /// Carrega os códigos de barras já cadastrados no workspace
    async fn load_piece_barcodes(&self, workspace_id: &str) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT barcode FROM piece WHERE workspace_id = ?1
            "#,
        )?;

        let barcodes = stmt
            .query_map(params![workspace_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(barcodes)
    }

    /// Grava o lote confirmado (tudo ou nada)
    async fn commit_batch(
        &self,
        batch: &ImportBatch,
        projects: &[Project],
        pieces: &[Piece],
    ) -> RepositoryResult<CommitStats> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let projects_written = Self::upsert_projects_tx(&tx, projects)?;
        let pieces_written = Self::upsert_pieces_tx(&tx, pieces)?;
        Self::insert_batch_tx(&tx, batch)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(CommitStats {
            pieces_written,
            projects_written,
        })
    }

    /// Lista os lotes mais recentes do workspace
    async fn list_batches(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, workspace_id, source, file_name, total_rows,
                   valid_rows, skipped_rows, error_count, warning_count,
                   committed_at, committed_by
            FROM import_batch
            WHERE workspace_id = ?1
            ORDER BY committed_at DESC
            LIMIT ?2
            "#,
        )?;

        let batches = stmt
            .query_map(params![workspace_id, limit as i64], |row| {
                let source_raw: String = row.get(2)?;
                let committed_at_raw: String = row.get(9)?;
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    workspace_id: row.get(1)?,
                    source: ImportSource::from_db_str(&source_raw),
                    file_name: row.get(3)?,
                    total_rows: row.get(4)?,
                    valid_rows: row.get(5)?,
                    skipped_rows: row.get(6)?,
                    error_count: row.get(7)?,
                    warning_count: row.get(8)?,
                    committed_at: Some(parse_timestamp(&committed_at_raw)),
                    committed_by: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{piece_id, project_id};

    fn test_repo() -> SqliteImportRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        SqliteImportRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn sample_piece(workspace: &str, barcode: &str) -> Piece {
        let now = Utc::now();
        Piece {
            piece_id: piece_id(workspace, barcode),
            workspace_id: workspace.to_string(),
            barcode: barcode.to_string(),
            piece_name: "Porta Superior".to_string(),
            piece_module: "Mod A".to_string(),
            dimensions: "500 x 300 x 18".to_string(),
            material: "MDF".to_string(),
            color: "Branco TX".to_string(),
            project_id: project_id(workspace, "C001", "Acme", "Cozinha-A"),
            project_name: "Cozinha-A".to_string(),
            client_code: "C001".to_string(),
            client_name: "Acme".to_string(),
            status: PieceStatus::Pending,
            produced_at: None,
            produced_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_project(workspace: &str) -> Project {
        let now = Utc::now();
        Project {
            project_id: project_id(workspace, "C001", "Acme", "Cozinha-A"),
            workspace_id: workspace.to_string(),
            name: "Cozinha-A".to_string(),
            client_name: "Acme".to_string(),
            client_code: "C001".to_string(),
            status: "ACTIVE".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_batch(workspace: &str, batch_id: &str) -> ImportBatch {
        ImportBatch {
            batch_id: batch_id.to_string(),
            workspace_id: workspace.to_string(),
            source: ImportSource::HaixunCsv,
            file_name: Some("manifesto.csv".to_string()),
            total_rows: 1,
            valid_rows: 1,
            skipped_rows: 0,
            error_count: 0,
            warning_count: 0,
            committed_at: Some(Utc::now()),
            committed_by: Some("teste".to_string()),
        }
    }

    #[tokio::test]
    async fn test_commit_batch_writes_everything() {
        let repo = test_repo();
        let pieces = vec![sample_piece("WS1", "BC123")];
        let projects = vec![sample_project("WS1")];

        let stats = repo
            .commit_batch(&sample_batch("WS1", "b1"), &projects, &pieces)
            .await
            .unwrap();
        assert_eq!(stats.pieces_written, 1);
        assert_eq!(stats.projects_written, 1);

        let barcodes = repo.load_piece_barcodes("WS1").await.unwrap();
        assert!(barcodes.contains("BC123"));

        let batches = repo.list_batches("WS1", 10).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].source, ImportSource::HaixunCsv);
    }

    #[tokio::test]
    async fn test_recommit_overwrites_and_resets_status() {
        let repo = test_repo();
        let projects = vec![sample_project("WS1")];
        let pieces = vec![sample_piece("WS1", "BC123")];

        repo.commit_batch(&sample_batch("WS1", "b1"), &projects, &pieces)
            .await
            .unwrap();

        // Simula a produção da peça entre as duas importações
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "UPDATE piece SET status = 'PRODUCED', produced_by = 'op' WHERE barcode = 'BC123'",
                [],
            )
            .unwrap();
        }

        let mut updated = sample_piece("WS1", "BC123");
        updated.piece_name = "Porta Inferior".to_string();
        repo.commit_batch(&sample_batch("WS1", "b2"), &projects, &[updated])
            .await
            .unwrap();

        let conn = repo.get_conn().unwrap();
        let (count, name, status, produced_by): (i64, String, String, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), piece_name, status, produced_by FROM piece WHERE barcode = 'BC123'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        // Reimportação não duplica, sobrescreve e volta para PENDING
        assert_eq!(count, 1);
        assert_eq!(name, "Porta Inferior");
        assert_eq!(status, "PENDING");
        assert_eq!(produced_by, None);
    }

    #[tokio::test]
    async fn test_barcodes_are_workspace_scoped() {
        let repo = test_repo();
        repo.commit_batch(
            &sample_batch("WS1", "b1"),
            &[sample_project("WS1")],
            &[sample_piece("WS1", "BC123")],
        )
        .await
        .unwrap();

        let other = repo.load_piece_barcodes("WS2").await.unwrap();
        assert!(other.is_empty());
    }
}
