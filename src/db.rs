// ==========================================
// Marcenaria Track - inicialização SQLite
// ==========================================
// Objetivo:
// - Unificar o comportamento de PRAGMA de todas as conexões
//   (evitar "uns módulos com foreign keys ligadas, outros não")
// - Unificar busy_timeout para reduzir erros esporádicos de busy
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// busy_timeout padrão (milissegundos)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version esperado pelo código atual (alinhado a `scripts/schema.sql`)
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Aplica os PRAGMAs unificados a uma conexão SQLite
///
/// Observações:
/// - foreign_keys precisa ser ligado por conexão
/// - busy_timeout precisa ser configurado por conexão
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Abre uma conexão SQLite já com a configuração unificada
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Instala o schema (idempotente: todos os CREATE usam IF NOT EXISTS)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(include_str!("../scripts/schema.sql"))
}

/// Lê o schema_version (retorna None se a tabela não existe)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_and_version() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        // Idempotente: aplicar duas vezes não pode falhar
        init_schema(&conn).unwrap();

        let version = read_schema_version(&conn).unwrap();
        assert_eq!(version, Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent() {
        let conn = Connection::open_in_memory().unwrap();
        let version = read_schema_version(&conn).unwrap();
        assert_eq!(version, None);
    }
}
