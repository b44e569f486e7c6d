// ==========================================
// Marcenaria Track - Repository de projetos
// ==========================================
// Responsabilidade: CRUD da tabela project
// ==========================================

use crate::domain::Project;
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

fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let created_at_raw: String = row.get(6)?;
    let updated_at_raw: String = row.get(7)?;
    Ok(Project {
        project_id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        client_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        client_code: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        status: row.get(5)?,
        created_at: parse_timestamp(&created_at_raw),
        updated_at: parse_timestamp(&updated_at_raw),
    })
}

// ==========================================
// ProjectRepository - Repositório de projetos
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
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

    /// Lista os projetos do workspace (mais recentes primeiro)
    pub fn list_projects(&self, workspace_id: &str) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, workspace_id, name, client_name, client_code,
                   status, created_at, updated_at
            FROM project
            WHERE workspace_id = ?1
            ORDER BY updated_at DESC, project_id
            "#,
        )?;

        let projects = stmt
            .query_map(params![workspace_id], map_project_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    /// Busca um projeto pelo id
    pub fn get_project(
        &self,
        workspace_id: &str,
        project_id: &str,
    ) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;

        let project = conn
            .query_row(
                r#"
                SELECT project_id, workspace_id, name, client_name, client_code,
                       status, created_at, updated_at
                FROM project
                WHERE project_id = ?1 AND workspace_id = ?2
                "#,
                params![project_id, workspace_id],
                map_project_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Remove um projeto e as peças dele, em uma transação
    ///
    /// piece.project_id é vínculo lógico (sem FK); a remoção das
    /// peças precisa ser explícita para não deixar órfãs.
    ///
    /// # Retorno
    /// - Ok(true): projeto removido
    /// - Ok(false): projeto não existia
    pub fn delete_project(&self, workspace_id: &str, project_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM piece WHERE project_id = ?1 AND workspace_id = ?2",
            params![project_id, workspace_id],
        )?;
        let changed = tx.execute(
            "DELETE FROM project WHERE project_id = ?1 AND workspace_id = ?2",
            params![project_id, workspace_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> ProjectRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ProjectRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn seed_project(repo: &ProjectRepository, workspace: &str, project_id: &str, name: &str) {
        let now = Utc::now().to_rfc3339();
        let conn = repo.get_conn().unwrap();
        conn.execute(
            r#"
            INSERT INTO project (project_id, workspace_id, name, client_name,
                                 client_code, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'Acme', 'C001', 'ACTIVE', ?4, ?4)
            "#,
            params![project_id, workspace, name, now],
        )
        .unwrap();
    }

    fn seed_piece(repo: &ProjectRepository, workspace: &str, barcode: &str, project_id: &str) {
        let now = Utc::now().to_rfc3339();
        let conn = repo.get_conn().unwrap();
        conn.execute(
            r#"
            INSERT INTO piece (piece_id, workspace_id, barcode, project_id,
                               status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?5)
            "#,
            params![format!("{}_{}", workspace, barcode), workspace, barcode, project_id, now],
        )
        .unwrap();
    }

    #[test]
    fn test_list_is_workspace_scoped() {
        let repo = test_repo();
        seed_project(&repo, "WS1", "P1", "Cozinha-A");
        seed_project(&repo, "WS2", "P2", "Sala");

        let projects = repo.list_projects("WS1").unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Cozinha-A");
    }

    #[test]
    fn test_delete_removes_project_pieces() {
        let repo = test_repo();
        seed_project(&repo, "WS1", "P1", "Cozinha-A");
        seed_piece(&repo, "WS1", "BC1", "P1");
        seed_piece(&repo, "WS1", "BC2", "P1");

        assert!(repo.delete_project("WS1", "P1").unwrap());
        assert!(repo.get_project("WS1", "P1").unwrap().is_none());

        let conn = repo.get_conn().unwrap();
        let pieces: i64 = conn
            .query_row("SELECT COUNT(*) FROM piece WHERE project_id = 'P1'", [], |r| r.get(0))
            .unwrap();
        // As peças do projeto caem junto
        assert_eq!(pieces, 0);
        drop(conn);

        assert!(!repo.delete_project("WS1", "P1").unwrap());
    }
}
