// ==========================================
// Marcenaria Track - Repository de peças
// ==========================================
// Responsabilidade: CRUD da tabela piece + bipagem de produção
// Linha vermelha: Repository não contém regra de negócio além da
// transição condicional PENDING -> PRODUCED
// ==========================================

use crate::domain::{piece_id, Piece, PieceStatus, ScanOutcome, StatusSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

/// Interpreta um timestamp rfc3339 vindo do banco
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Mapeia uma linha do SELECT padrão de piece para a entidade
///
/// A ordem das colunas é a do schema; todo SELECT deste arquivo
/// projeta as 17 colunas nessa ordem.
fn map_piece_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Piece> {
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
}

const PIECE_COLUMNS: &str = "piece_id, workspace_id, barcode, piece_name, piece_module, \
     project_id, project_name, client_code, client_name, dimensions, \
     material, color, status, produced_at, produced_by, created_at, updated_at";

// ==========================================
// PieceRepository - Repositório de peças
// ==========================================
pub struct PieceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PieceRepository {
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

    /// Busca uma peça pelo id (escopada ao workspace)
    fn find_piece(
        conn: &Connection,
        workspace_id: &str,
        piece_id: &str,
    ) -> RepositoryResult<Option<Piece>> {
        let sql = format!(
            "SELECT {} FROM piece WHERE piece_id = ?1 AND workspace_id = ?2",
            PIECE_COLUMNS
        );
        let piece = conn
            .query_row(&sql, params![piece_id, workspace_id], map_piece_row)
            .optional()?;
        Ok(piece)
    }

    /// Bipagem de produção: transição PENDING -> PRODUCED
    ///
    /// # Parâmetros
    /// - workspace_id: espaço de trabalho
    /// - barcode: código lido (será normalizado)
    /// - operator: quem bipou
    ///
    /// # Retorno
    /// - Ok(ScanOutcome::Produced): transição efetivada agora
    /// - Ok(ScanOutcome::AlreadyProduced): peça já estava produzida
    /// - Ok(ScanOutcome::NotFound): código não cadastrado
    ///
    /// # Regras
    /// - A segunda bipagem do mesmo código não altera nada
    /// - O UPDATE é condicional ao status PENDING
    pub fn mark_produced(
        &self,
        workspace_id: &str,
        barcode: &str,
        operator: &str,
    ) -> RepositoryResult<ScanOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let id = piece_id(workspace_id, barcode);
        let piece = match Self::find_piece(&tx, workspace_id, &id)? {
            Some(piece) => piece,
            None => return Ok(ScanOutcome::NotFound),
        };

        if piece.status == PieceStatus::Produced {
            return Ok(ScanOutcome::AlreadyProduced(piece));
        }

        let now = Utc::now();
        let changed = tx.execute(
            r#"
            UPDATE piece
            SET status = 'PRODUCED', produced_at = ?1, produced_by = ?2, updated_at = ?1
            WHERE piece_id = ?3 AND workspace_id = ?4 AND status = 'PENDING'
            "#,
            params![now.to_rfc3339(), operator, id, workspace_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        if changed == 0 {
            // Guarda condicional: outra bipagem venceu a corrida
            return Ok(ScanOutcome::AlreadyProduced(piece));
        }

        let mut produced = piece;
        produced.status = PieceStatus::Produced;
        produced.produced_at = Some(now);
        produced.produced_by = Some(operator.to_string());
        produced.updated_at = now;
        Ok(ScanOutcome::Produced(produced))
    }

    /// Busca uma peça pelo código de barras
    pub fn find_by_barcode(
        &self,
        workspace_id: &str,
        barcode: &str,
    ) -> RepositoryResult<Option<Piece>> {
        let conn = self.get_conn()?;
        let id = piece_id(workspace_id, barcode);
        Self::find_piece(&conn, workspace_id, &id)
    }

    /// Busca uma peça pelo id
    pub fn get_piece(&self, workspace_id: &str, piece_id: &str) -> RepositoryResult<Option<Piece>> {
        let conn = self.get_conn()?;
        Self::find_piece(&conn, workspace_id, piece_id)
    }

    /// Lista peças do workspace com filtros opcionais
    ///
    /// # Parâmetros
    /// - status: filtra por PENDING/PRODUCED quando informado
    /// - project_id: filtra por projeto quando informado
    /// - search: busca parcial em código, nome da peça e cliente
    ///
    /// # Retorno
    /// - Ok(Vec<Piece>): mais recentes primeiro
    pub fn list_pieces(
        &self,
        workspace_id: &str,
        status: Option<PieceStatus>,
        project_id: Option<&str>,
        search: Option<&str>,
    ) -> RepositoryResult<Vec<Piece>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM piece WHERE workspace_id = ?1",
            PIECE_COLUMNS
        );
        let mut values: Vec<String> = vec![workspace_id.to_string()];

        if let Some(status) = status {
            values.push(status.to_db_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(project_id) = project_id {
            values.push(project_id.to_string());
            sql.push_str(&format!(" AND project_id = ?{}", values.len()));
        }
        if let Some(search) = search {
            let pattern = format!("%{}%", search.trim());
            let first = values.len() + 1;
            values.push(pattern.clone());
            values.push(pattern.clone());
            values.push(pattern);
            sql.push_str(&format!(
                " AND (barcode LIKE ?{} OR piece_name LIKE ?{} OR client_name LIKE ?{})",
                first,
                first + 1,
                first + 2
            ));
        }
        sql.push_str(" ORDER BY updated_at DESC, piece_id");

        let mut stmt = conn.prepare(&sql)?;
        let pieces = stmt
            .query_map(params_from_iter(values.iter()), map_piece_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pieces)
    }

    /// Resumo de produção do workspace (opcionalmente por projeto)
    pub fn status_summary(
        &self,
        workspace_id: &str,
        project_id: Option<&str>,
    ) -> RepositoryResult<StatusSummary> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'PRODUCED' THEN 1 ELSE 0 END), 0)
            FROM piece
            WHERE workspace_id = ?1
            "#,
        );
        let mut values: Vec<String> = vec![workspace_id.to_string()];
        if let Some(project_id) = project_id {
            values.push(project_id.to_string());
            sql.push_str(" AND project_id = ?2");
        }

        let summary = conn.query_row(&sql, params_from_iter(values.iter()), |row| {
            Ok(StatusSummary {
                total: row.get(0)?,
                pending: row.get(1)?,
                produced: row.get(2)?,
            })
        })?;
        Ok(summary)
    }

    /// Remove uma peça do cadastro
    ///
    /// O vínculo com volume (se houver) cai junto pelo CASCADE.
    ///
    /// # Retorno
    /// - Ok(true): peça removida
    /// - Ok(false): peça não existia
    pub fn delete_piece(&self, workspace_id: &str, piece_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "DELETE FROM piece WHERE piece_id = ?1 AND workspace_id = ?2",
            params![piece_id, workspace_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> PieceRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        PieceRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn seed_piece(repo: &PieceRepository, workspace: &str, barcode: &str, project: &str) {
        let now = Utc::now().to_rfc3339();
        let conn = repo.get_conn().unwrap();
        conn.execute(
            r#"
            INSERT INTO piece (
                piece_id, workspace_id, barcode, piece_name, piece_module,
                project_id, project_name, client_code, client_name,
                dimensions, material, color, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 'Mod A', ?5, ?5, 'C001', 'Acme',
                      '500 x 300 x 18', 'MDF', 'Branco', 'PENDING', ?6, ?6)
            "#,
            params![
                piece_id(workspace, barcode),
                workspace,
                barcode,
                format!("Peça {}", barcode),
                project,
                now,
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_scan_produces_then_reports_already_produced() {
        let repo = test_repo();
        seed_piece(&repo, "WS1", "BC123", "P1");

        // Primeira bipagem: transição efetivada
        let first = repo.mark_produced("WS1", "bc123", "op1").unwrap();
        match first {
            ScanOutcome::Produced(piece) => {
                assert_eq!(piece.status, PieceStatus::Produced);
                assert_eq!(piece.produced_by.as_deref(), Some("op1"));
                assert!(piece.produced_at.is_some());
            }
            other => panic!("esperava Produced, veio {:?}", other),
        }

        // Segunda bipagem: nada muda
        let second = repo.mark_produced("WS1", "BC123", "op2").unwrap();
        match second {
            ScanOutcome::AlreadyProduced(piece) => {
                // Dados da primeira bipagem preservados
                assert_eq!(piece.produced_by.as_deref(), Some("op1"));
            }
            other => panic!("esperava AlreadyProduced, veio {:?}", other),
        }
    }

    #[test]
    fn test_scan_unknown_barcode() {
        let repo = test_repo();
        let outcome = repo.mark_produced("WS1", "BC999", "op1").unwrap();
        assert_eq!(outcome, ScanOutcome::NotFound);
    }

    #[test]
    fn test_scan_is_workspace_scoped() {
        let repo = test_repo();
        seed_piece(&repo, "WS1", "BC123", "P1");

        // Mesmo código em outro workspace não aparece
        let outcome = repo.mark_produced("WS2", "BC123", "op1").unwrap();
        assert_eq!(outcome, ScanOutcome::NotFound);
    }

    #[test]
    fn test_list_with_filters() {
        let repo = test_repo();
        seed_piece(&repo, "WS1", "BC1", "P1");
        seed_piece(&repo, "WS1", "BC2", "P1");
        seed_piece(&repo, "WS1", "BC3", "P2");
        repo.mark_produced("WS1", "BC1", "op").unwrap();

        let all = repo.list_pieces("WS1", None, None, None).unwrap();
        assert_eq!(all.len(), 3);

        let pending = repo
            .list_pieces("WS1", Some(PieceStatus::Pending), None, None)
            .unwrap();
        assert_eq!(pending.len(), 2);

        let project = repo.list_pieces("WS1", None, Some("P2"), None).unwrap();
        assert_eq!(project.len(), 1);
        assert_eq!(project[0].barcode, "BC3");

        let search = repo.list_pieces("WS1", None, None, Some("BC2")).unwrap();
        assert_eq!(search.len(), 1);

        let combined = repo
            .list_pieces("WS1", Some(PieceStatus::Produced), Some("P1"), Some("BC"))
            .unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].barcode, "BC1");
    }

    #[test]
    fn test_status_summary() {
        let repo = test_repo();
        seed_piece(&repo, "WS1", "BC1", "P1");
        seed_piece(&repo, "WS1", "BC2", "P1");
        repo.mark_produced("WS1", "BC1", "op").unwrap();

        let summary = repo.status_summary("WS1", None).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.produced, 1);

        // Workspace vazio: tudo zero
        let empty = repo.status_summary("WS2", None).unwrap();
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn test_delete_piece() {
        let repo = test_repo();
        seed_piece(&repo, "WS1", "BC1", "P1");

        let id = piece_id("WS1", "BC1");
        assert!(repo.delete_piece("WS1", &id).unwrap());
        assert!(!repo.delete_piece("WS1", &id).unwrap());
        assert!(repo.get_piece("WS1", &id).unwrap().is_none());
    }
}
