// ==========================================
// Marcenaria Track - Trait de leitura de configuração da importação
// ==========================================
// Responsabilidade: definir a interface de leitura de configuração
// usada pelo pipeline de importação (sem implementação)
// Restrição: não contém escrita de configuração nem regra de negócio
// ==========================================

use crate::repository::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// Uso: interface de configuração consumida pelo importador
// Implementador: ConfigManager (lê da tabela config_kv)
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// Identificador do workspace ativo
    ///
    /// # Retorno
    /// - String: id estável gerado no primeiro uso do banco
    ///
    /// # Erro
    /// - NotFound quando o bootstrap ainda não rodou
    async fn workspace_id(&self) -> RepositoryResult<String>;

    /// Nome de cliente aplicado quando a etiqueta PDF não identifica o cliente
    ///
    /// # Retorno
    /// - String: nome configurado
    ///
    /// # Padrão
    /// - Texto localizado de "import.default_client_name"
    async fn default_client_name(&self) -> RepositoryResult<String>;
}
