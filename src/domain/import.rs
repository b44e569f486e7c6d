// ==========================================
// Marcenaria Track - Modelo da importação
// ==========================================
// Estruturas que atravessam o pipeline de importação:
// extração -> validação -> prévia -> confirmação
// Nenhuma delas é persistida diretamente (exceto ImportBatch)
// ==========================================

use crate::domain::types::{ImportSource, IssueKind, IssueSeverity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RowLocator - Posição da linha na origem
// ==========================================
// CSV aponta linha (1-based); PDF aponta página
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowLocator {
    Line(usize),
    Page(u32),
}

impl fmt::Display for RowLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLocator::Line(n) => write!(f, "linha {}", n),
            RowLocator::Page(p) => write!(f, "página {}", p),
        }
    }
}

// ==========================================
// ImportIssue - Ocorrência de validação
// ==========================================
// Toda falha vira uma ocorrência com mensagem legível; o pipeline
// nunca interrompe no primeiro problema de linha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub kind: IssueKind,             // classificação fixa
    pub severity: IssueSeverity,     // Warning / Error / Critical
    pub field: Option<String>,       // campo de origem ("codigo", "largura", ...)
    pub locator: RowLocator,         // onde o problema apareceu
    pub message: String,             // mensagem já traduzida (i18n)
    pub suggestion: Option<String>,  // ação sugerida ao operador
}

// ==========================================
// RawPieceRow - Linha bruta extraída
// ==========================================
// Produto da extração (CSV ou PDF), antes de qualquer validação.
// Todos os campos são texto cru; vazio = ausente na origem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPieceRow {
    pub client_code: String,   // código do cliente (CSV col 16)
    pub client_name: String,   // nome do cliente
    pub project_name: String,  // nome do projeto/ambiente
    pub barcode: String,       // código de barras como veio
    pub piece_module: String,  // módulo dentro do projeto
    pub piece_name: String,    // descrição da peça
    pub dim_length: String,    // comprimento como veio (pode ter vírgula)
    pub dim_width: String,     // largura como veio
    pub dim_thickness: String, // espessura como veio
    pub material: String,      // chapa
    pub color: String,         // acabamento
    pub locator: RowLocator,   // posição na origem
}

impl RawPieceRow {
    /// Linha vazia ancorada em uma posição da origem
    pub fn empty(locator: RowLocator) -> Self {
        RawPieceRow {
            client_code: String::new(),
            client_name: String::new(),
            project_name: String::new(),
            barcode: String::new(),
            piece_module: String::new(),
            piece_name: String::new(),
            dim_length: String::new(),
            dim_width: String::new(),
            dim_thickness: String::new(),
            material: String::new(),
            color: String::new(),
            locator,
        }
    }

}

// ==========================================
// ImportRecord - Registro normalizado
// ==========================================
// Produto da validação: campos prontos para virar Piece/Project.
// Código em maiúsculo, medidas com ponto decimal, padrões aplicados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub client_code: String,
    pub client_name: String,
    pub project_name: String,
    pub barcode: String,       // normalizado (MAIÚSCULO, sem espaços)
    pub piece_module: String,
    pub piece_name: String,
    pub dim_length: String,    // decimal com ponto; "0" quando ausente
    pub dim_width: String,
    pub dim_thickness: String,
    pub material: String,
    pub color: String,
    pub locator: RowLocator,
}

impl ImportRecord {
    /// Medidas compostas no formato de exibição "C x L x E"
    pub fn dimensions(&self) -> String {
        format!("{} x {} x {}", self.dim_length, self.dim_width, self.dim_thickness)
    }
}

// ==========================================
// StagedRecord - Linha preparada para confirmação
// ==========================================
// Par (bruto, normalizado) + ocorrências; o índice identifica a
// linha dentro do lote para edição em tela.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub index: usize,             // posição estável dentro do lote
    pub raw: RawPieceRow,         // como veio da origem
    pub record: ImportRecord,     // como vai ser gravado
    pub issues: Vec<ImportIssue>, // ocorrências desta linha
    pub valid: bool,              // sem ocorrência Error/Critical
}

impl StagedRecord {
    /// Recalcula a validade a partir das ocorrências
    pub fn recompute_valid(&mut self) {
        self.valid = !self
            .issues
            .iter()
            .any(|i| i.severity >= IssueSeverity::Error);
    }
}

// ==========================================
// RecordEdit - Edição de linha na prévia
// ==========================================
// Campos None permanecem como estão; Some substitui o valor bruto
// e dispara revalidação completa da linha.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordEdit {
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub project_name: Option<String>,
    pub barcode: Option<String>,
    pub piece_module: Option<String>,
    pub piece_name: Option<String>,
    pub dim_length: Option<String>,
    pub dim_width: Option<String>,
    pub dim_thickness: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
}

impl RecordEdit {
    /// Aplica a edição sobre a linha bruta (campos None ficam intactos)
    pub fn apply_to(&self, raw: &mut RawPieceRow) {
        if let Some(v) = &self.client_code {
            raw.client_code = v.clone();
        }
        if let Some(v) = &self.client_name {
            raw.client_name = v.clone();
        }
        if let Some(v) = &self.project_name {
            raw.project_name = v.clone();
        }
        if let Some(v) = &self.barcode {
            raw.barcode = v.clone();
        }
        if let Some(v) = &self.piece_module {
            raw.piece_module = v.clone();
        }
        if let Some(v) = &self.piece_name {
            raw.piece_name = v.clone();
        }
        if let Some(v) = &self.dim_length {
            raw.dim_length = v.clone();
        }
        if let Some(v) = &self.dim_width {
            raw.dim_width = v.clone();
        }
        if let Some(v) = &self.dim_thickness {
            raw.dim_thickness = v.clone();
        }
        if let Some(v) = &self.material {
            raw.material = v.clone();
        }
        if let Some(v) = &self.color {
            raw.color = v.clone();
        }
    }
}

// ==========================================
// ClientPreviewGroup - Prévia por cliente
// ==========================================
// Agregação determinística exibida antes da confirmação.
// Ordenada por chave de cliente; projetos ordenados por nome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPreviewGroup {
    pub client_key: String,            // código do cliente ou nome (fallback)
    pub client_name: String,
    pub client_code: String,           // vazio quando a origem não informa
    pub piece_count: usize,            // total de peças válidas do cliente
    pub projects: Vec<ProjectPreview>, // projetos do cliente, ordenados
}

// ==========================================
// ProjectPreview - Prévia por projeto
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPreview {
    pub project_name: String,
    pub piece_count: usize,
    pub modules: Vec<String>, // módulos distintos, ordenados
}

// ==========================================
// AnalyzeReport - Resultado da análise
// ==========================================
// Fotografia completa do lote preparado: linhas, ocorrências e
// prévia agregada. É o que a tela de conferência exibe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeReport {
    pub batch_id: String,                 // UUID do lote preparado
    pub source: ImportSource,
    pub file_name: String,
    pub total_rows: usize,                // linhas de dados vistas na origem
    pub skipped_rows: usize,              // linhas descartadas na extração
    pub valid_count: usize,               // linhas prontas para gravação
    pub error_count: usize,               // ocorrências Error/Critical
    pub warning_count: usize,             // ocorrências Warning
    pub issues: Vec<ImportIssue>,         // todas as ocorrências (arquivo + linhas)
    pub records: Vec<StagedRecord>,       // linhas preparadas, na ordem da origem
    pub preview: Vec<ClientPreviewGroup>, // agregação por cliente/projeto
    pub message: String,                  // resumo traduzido (i18n)
}

// ==========================================
// CommitReport - Resultado da confirmação
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReport {
    pub batch_id: String,
    pub pieces_written: usize,
    pub projects_written: usize,
    pub client_count: usize,
    pub message: String, // resumo traduzido (i18n)
}

// ==========================================
// ImportBatch - Lote de importação persistido
// ==========================================
// Histórico de auditoria: um registro por confirmação bem-sucedida.
// Alinhado a: scripts/schema.sql (tabela import_batch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub workspace_id: String,
    pub source: ImportSource,
    pub file_name: Option<String>,
    pub total_rows: i32,
    pub valid_rows: i32,    // peças efetivamente gravadas
    pub skipped_rows: i32,
    pub error_count: i32,
    pub warning_count: i32,
    pub committed_at: Option<DateTime<Utc>>,
    pub committed_by: Option<String>,
}
