// ==========================================
// Marcenaria Track - Gerenciador de configuração
// ==========================================
// Responsabilidade: leitura, escrita e bootstrap da configuração
// Armazenamento: tabela config_kv (key-value + escopo)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// ConfigManager - Gerenciador de configuração
// ==========================================
#[derive(Clone)]
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Cria um ConfigManager com conexão própria
    ///
    /// # Parâmetros
    /// - db_path: caminho do arquivo de banco
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Cria um ConfigManager sobre uma conexão existente
    ///
    /// Reaplica os PRAGMAs padronizados na conexão recebida (idempotente)
    /// para garantir comportamento uniforme.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Lê um valor da tabela config_kv (scope_id = 'global')
    ///
    /// # Retorno
    /// - Some(String): valor configurado
    /// - None: chave ausente
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Lê um valor com fallback
    pub fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Grava (UPSERT) um valor no escopo global
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Garante que o workspace tem um identificador estável
    ///
    /// No primeiro uso do banco gera um UUID e o persiste; nas aberturas
    /// seguintes devolve sempre o mesmo valor.
    pub fn ensure_workspace_id(&self) -> RepositoryResult<String> {
        if let Some(existing) = self.get_config_value(config_keys::WORKSPACE_ID)? {
            return Ok(existing);
        }
        let generated = Uuid::new_v4().to_string();
        self.set_config_value(config_keys::WORKSPACE_ID, &generated)?;
        tracing::info!(workspace_id = %generated, "workspace inicializado");
        Ok(generated)
    }

    /// Idioma configurado da aplicação
    ///
    /// # Padrão
    /// - "pt-BR"
    pub fn get_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::APP_LOCALE, "pt-BR")
    }

    /// Persiste o idioma da aplicação
    pub fn set_app_locale(&self, locale: &str) -> RepositoryResult<()> {
        self.set_config_value(config_keys::APP_LOCALE, locale)
    }
}

// ==========================================
// Implementação do trait ImportConfigReader
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn workspace_id(&self) -> RepositoryResult<String> {
        self.get_config_value(config_keys::WORKSPACE_ID)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "config".to_string(),
                id: config_keys::WORKSPACE_ID.to_string(),
            })
    }

    async fn default_client_name(&self) -> RepositoryResult<String> {
        let fallback = crate::i18n::t("import.default_client_name");
        self.get_config_or_default(config_keys::DEFAULT_CLIENT_NAME, &fallback)
    }
}

// ==========================================
// Chaves de configuração
// ==========================================
pub mod config_keys {
    /// Identificador do workspace, gerado no bootstrap
    pub const WORKSPACE_ID: &str = "workspace.id";

    /// Idioma da interface ("pt-BR" ou "en")
    pub const APP_LOCALE: &str = "app.locale";

    /// Nome de cliente usado quando a etiqueta PDF não traz cliente
    pub const DEFAULT_CLIENT_NAME: &str = "import.default_client_name";
}
