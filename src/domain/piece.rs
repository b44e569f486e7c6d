// ==========================================
// Marcenaria Track - Peças e projetos
// ==========================================
// Entidades persistidas do chão de fábrica
// Alinhado a: scripts/schema.sql (tabelas piece e project)
// ==========================================

use crate::domain::types::PieceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Piece - Peça de marcenaria
// ==========================================
// Identidade: workspace + código de barras (função pura, sem
// sorteio de id). Reimportar a mesma peça sobrescreve o cadastro
// e devolve o status para PENDING.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    // ===== Identidade =====
    pub piece_id: String,     // derivado: workspace_id + "_" + código normalizado
    pub workspace_id: String, // espaço de trabalho dono da peça
    pub barcode: String,      // código de barras normalizado (MAIÚSCULO, sem espaços)

    // ===== Descrição =====
    pub piece_name: String,         // nome da peça (ex.: "Porta Superior")
    pub piece_module: String,       // módulo/ambiente dentro do projeto
    pub dimensions: String,         // "C x L x E" já normalizado (ponto decimal)
    pub material: String,           // chapa (ex.: "MDF 18mm")
    pub color: String,              // acabamento (ex.: "Branco TX")

    // ===== Vínculo com projeto/cliente =====
    pub project_id: String,   // FK lógica para project
    pub project_name: String, // nome do projeto (desnormalizado para listagem)
    pub client_code: String,  // código do cliente (pode ser vazio no PDF)
    pub client_name: String,  // nome do cliente

    // ===== Produção =====
    pub status: PieceStatus,                 // PENDING ou PRODUCED
    pub produced_at: Option<DateTime<Utc>>,  // momento da bipagem
    pub produced_by: Option<String>,         // operador que bipou

    // ===== Auditoria =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Project - Projeto do cliente
// ==========================================
// Agrupamento lógico das peças (ex.: "Cozinha-A" da Acme Móveis).
// Reimportações fazem upsert pelo id determinístico.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,   // derivado de workspace + cliente + nome do projeto
    pub workspace_id: String,
    pub name: String,         // nome do projeto (ex.: "Cozinha-A")
    pub client_name: String,
    pub client_code: String,  // vazio quando a origem não informa
    pub status: String,       // ACTIVE por padrão
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// ScanOutcome - Resultado da bipagem
// ==========================================
// A bipagem é idempotente no sentido fraco: a segunda leitura do
// mesmo código não altera nada e devolve AlreadyProduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Produced(Piece),        // transição PENDING -> PRODUCED efetivada agora
    AlreadyProduced(Piece), // peça já estava produzida; nada mudou
    NotFound,               // código não cadastrado neste workspace
}

// ==========================================
// StatusSummary - Resumo por status
// ==========================================
// Payload do painel de acompanhamento
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: i64,
    pub pending: i64,
    pub produced: i64,
}

// ==========================================
// Funções de identidade
// ==========================================

/// Calcula o id determinístico de uma peça
///
/// # Parâmetros
/// - workspace_id: espaço de trabalho
/// - barcode: código de barras bruto (será normalizado)
///
/// # Retorno
/// - id estável: a mesma peça importada duas vezes gera o mesmo id
pub fn piece_id(workspace_id: &str, barcode: &str) -> String {
    format!("{}_{}", workspace_id, normalize_barcode(barcode))
}

/// Calcula o id determinístico de um projeto
///
/// A chave do cliente prioriza o código; sem código, usa o nome.
/// Assim etiquetas PDF (sem código) e CSV (com código) não colidem
/// entre clientes distintos, mas reimportações colidem de propósito.
pub fn project_id(workspace_id: &str, client_code: &str, client_name: &str, project_name: &str) -> String {
    let client_key = if client_code.trim().is_empty() {
        client_name
    } else {
        client_code
    };
    format!(
        "{}_{}_{}",
        workspace_id,
        slug(client_key),
        slug(project_name)
    )
}

/// Normaliza um código de barras: remove espaços das pontas e põe em maiúsculo
pub fn normalize_barcode(barcode: &str) -> String {
    barcode.trim().to_uppercase()
}

/// Reduz um texto a um identificador estável
///
/// Letras e dígitos viram maiúsculas; qualquer outro caractere vira '-'.
/// Letras acentuadas são preservadas ("Módulo" -> "MÓDULO"): o objetivo
/// é estabilidade do id, não ASCII puro.
fn slug(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_uppercase().next().unwrap_or(c)
            } else {
                '-'
            }
        })
        .collect()
}
