// ==========================================
// Marcenaria Track - Repository Trait da importação
// ==========================================
// Responsabilidade: interface de acesso a dados da importação
// (sem regra de negócio)
// Linha vermelha: Repository só faz CRUD; decisão fica no importador
// ==========================================

use crate::domain::{ImportBatch, Piece, Project};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// CommitStats - Contadores da gravação
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitStats {
    pub pieces_written: usize,
    pub projects_written: usize,
}

// ==========================================
// ImportRepository Trait
// ==========================================
// Uso: acesso a dados do pipeline de importação
// Implementador: SqliteImportRepository (rusqlite)
#[async_trait]
pub trait ImportRepository: Send + Sync {
    // ===== Consulta =====

    /// Carrega os códigos de barras já cadastrados no workspace
    ///
    /// Lido uma vez por análise; a detecção de duplicidade compara
    /// contra este conjunto em memória.
    ///
    /// # Parâmetros
    /// - workspace_id: espaço de trabalho
    ///
    /// # Retorno
    /// - Ok(HashSet<String>): códigos normalizados existentes
    async fn load_piece_barcodes(&self, workspace_id: &str) -> RepositoryResult<HashSet<String>>;

    // ===== Gravação em lote (transacional) =====

    /// Grava o lote confirmado em uma única transação
    ///
    /// Projetos e peças entram por upsert pelo id determinístico:
    /// reimportar o mesmo manifesto sobrescreve em vez de duplicar.
    /// Peças reimportadas voltam para PENDING.
    ///
    /// # Parâmetros
    /// - batch: registro de auditoria do lote
    /// - projects: projetos do lote (já deduplicados)
    /// - pieces: peças do lote
    ///
    /// # Retorno
    /// - Ok(CommitStats): contadores da gravação
    /// - Err: erro de banco (transação inteira desfeita)
    async fn commit_batch(
        &self,
        batch: &ImportBatch,
        projects: &[Project],
        pieces: &[Piece],
    ) -> RepositoryResult<CommitStats>;

    // ===== Histórico =====

    /// Lista os lotes mais recentes do workspace
    ///
    /// # Parâmetros
    /// - workspace_id: espaço de trabalho
    /// - limit: quantidade máxima de lotes
    async fn list_batches(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>>;
}
