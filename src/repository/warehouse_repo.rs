// ==========================================
// Marcenaria Track - Repository de galpões
// ==========================================
// Responsabilidade: cadastro dos galpões de expedição (tabela warehouse)
// ==========================================

use crate::domain::Warehouse;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn map_warehouse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Warehouse> {
    let active_raw: i64 = row.get(3)?;
    let created_at_raw: String = row.get(4)?;
    Ok(Warehouse {
        warehouse_id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        active: active_raw != 0,
        created_at: parse_timestamp(&created_at_raw),
    })
}

// ==========================================
// WarehouseRepository - Repositório de galpões
// ==========================================
pub struct WarehouseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WarehouseRepository {
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

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insere um galpão novo
    pub fn insert_warehouse(&self, warehouse: &Warehouse) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO warehouse (warehouse_id, workspace_id, name, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                warehouse.warehouse_id,
                warehouse.workspace_id,
                warehouse.name,
                warehouse.active as i64,
                warehouse.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Busca um galpão pelo id
    pub fn get_warehouse(
        &self,
        workspace_id: &str,
        warehouse_id: &str,
    ) -> RepositoryResult<Option<Warehouse>> {
        let conn = self.get_conn()?;
        let warehouse = conn
            .query_row(
                r#"
                SELECT warehouse_id, workspace_id, name, active, created_at
                FROM warehouse
                WHERE warehouse_id = ?1 AND workspace_id = ?2
                "#,
                params![warehouse_id, workspace_id],
                map_warehouse_row,
            )
            .optional()?;
        Ok(warehouse)
    }

    /// Lista os galpões do workspace
    ///
    /// # Parâmetros
    /// - only_active: quando true, esconde os desativados
    pub fn list_warehouses(
        &self,
        workspace_id: &str,
        only_active: bool,
    ) -> RepositoryResult<Vec<Warehouse>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            "SELECT warehouse_id, workspace_id, name, active, created_at \
             FROM warehouse WHERE workspace_id = ?1",
        );
        if only_active {
            sql.push_str(" AND active = 1");
        }
        sql.push_str(" ORDER BY name, warehouse_id");

        let mut stmt = conn.prepare(&sql)?;
        let warehouses = stmt
            .query_map(params![workspace_id], map_warehouse_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(warehouses)
    }

    /// Ativa/desativa um galpão
    ///
    /// Desativar tira o galpão das listagens de escolha sem órfanar
    /// os volumes já vinculados a ele.
    pub fn set_active(
        &self,
        workspace_id: &str,
        warehouse_id: &str,
        active: bool,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE warehouse SET active = ?1 WHERE warehouse_id = ?2 AND workspace_id = ?3",
            params![active as i64, warehouse_id, workspace_id],
        )?;
        Ok(changed > 0)
    }

    /// Renomeia um galpão
    pub fn rename(
        &self,
        workspace_id: &str,
        warehouse_id: &str,
        name: &str,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE warehouse SET name = ?1 WHERE warehouse_id = ?2 AND workspace_id = ?3",
            params![name, warehouse_id, workspace_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_repo() -> WarehouseRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        WarehouseRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn seed_warehouse(repo: &WarehouseRepository, workspace: &str, name: &str) -> Warehouse {
        let warehouse = Warehouse {
            warehouse_id: Uuid::new_v4().to_string(),
            workspace_id: workspace.to_string(),
            name: name.to_string(),
            active: true,
            created_at: Utc::now(),
        };
        repo.insert_warehouse(&warehouse).unwrap();
        warehouse
    }

    #[test]
    fn test_list_sorted_by_name() {
        let repo = test_repo();
        seed_warehouse(&repo, "WS1", "Galpão B");
        seed_warehouse(&repo, "WS1", "Galpão A");
        seed_warehouse(&repo, "WS2", "Outro workspace");

        let list = repo.list_warehouses("WS1", false).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Galpão A");
        assert_eq!(list[1].name, "Galpão B");
    }

    #[test]
    fn test_deactivated_hidden_from_active_listing() {
        let repo = test_repo();
        let keep = seed_warehouse(&repo, "WS1", "Galpão A");
        let hide = seed_warehouse(&repo, "WS1", "Galpão B");

        assert!(repo.set_active("WS1", &hide.warehouse_id, false).unwrap());

        let active = repo.list_warehouses("WS1", true).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].warehouse_id, keep.warehouse_id);

        let all = repo.list_warehouses("WS1", false).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_rename_scoped_by_workspace() {
        let repo = test_repo();
        let warehouse = seed_warehouse(&repo, "WS1", "Galpão A");

        assert!(!repo.rename("WS2", &warehouse.warehouse_id, "Invadido").unwrap());
        assert!(repo.rename("WS1", &warehouse.warehouse_id, "Galpão Central").unwrap());

        let found = repo
            .get_warehouse("WS1", &warehouse.warehouse_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Galpão Central");
    }
}
