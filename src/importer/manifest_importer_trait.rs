// ==========================================
// Marcenaria Track - Traits da importação
// ==========================================
// Responsabilidade: definir as interfaces do pipeline de
// importação de manifestos (sem implementação)
// ==========================================

use crate::domain::{
    AnalyzeReport, ClientPreviewGroup, CommitReport, ImportIssue, ImportRecord, ImportSource,
    RawPieceRow, RecordEdit, StagedRecord,
};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// ManifestImporter Trait
// ==========================================
// Uso: interface principal da importação em duas fases
// Implementador: ManifestImporterImpl
//
// Contrato de concorrência: uma análise/confirmação por vez.
// Chamadas enquanto outra está em andamento retornam Ok(None)
// sem efeito colateral (a interface trata como "ocupado").
#[async_trait]
pub trait ManifestImporter: Send + Sync {
    /// Analisa um manifesto e prepara o lote para conferência
    ///
    /// # Parâmetros
    /// - file_path: caminho do manifesto (.csv ou .pdf)
    ///
    /// # Retorno
    /// - Ok(Some(AnalyzeReport)): lote preparado, aguardando confirmação
    /// - Ok(None): outra operação em andamento; nada foi feito
    /// - Err: arquivo ilegível ou sem nenhuma linha válida
    ///
    /// # Fluxo da análise (6 etapas)
    /// 1. Seleção do extrator pela extensão
    /// 2. Extração das linhas brutas
    /// 3. Validação campo a campo
    /// 4. Detecção de duplicidade (PDF)
    /// 5. Agregação cliente -> projeto
    /// 6. Montagem da prévia
    async fn analyze<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<Option<AnalyzeReport>>;

    /// Confirma o lote preparado e grava tudo em uma transação
    ///
    /// # Parâmetros
    /// - operator: identificação de quem confirmou
    ///
    /// # Retorno
    /// - Ok(Some(CommitReport)): gravação completa; lote descartado
    /// - Ok(None): nenhum lote preparado, ou outra operação em andamento
    /// - Err: falha de gravação; o lote preparado é preservado para
    ///   nova tentativa
    async fn confirm(&self, operator: &str) -> ImportResult<Option<CommitReport>>;

    /// Descarta o lote preparado sem gravar nada
    ///
    /// # Retorno
    /// - true: havia lote preparado e foi descartado
    /// - false: nada a descartar (ou operação em andamento)
    fn cancel(&self) -> bool;

    /// Fotografia do lote preparado (se houver)
    fn staged(&self) -> Option<AnalyzeReport>;

    /// Edita uma linha do lote preparado e revalida
    ///
    /// # Parâmetros
    /// - index: posição da linha dentro do lote
    /// - edit: campos a substituir (None = mantém)
    ///
    /// # Retorno
    /// - Ok(Some(StagedRecord)): linha revalidada (a prévia é recalculada)
    /// - Ok(None): índice inexistente, sem lote, ou operação em andamento
    fn update_staged_record(
        &self,
        index: usize,
        edit: RecordEdit,
    ) -> ImportResult<Option<StagedRecord>>;
}

// ==========================================
// RowExtractor Trait
// ==========================================
// Uso: extração de linhas brutas de um formato de origem (etapa 2)
// Implementadores: HaixunCsvExtractor, PromobPdfExtractor
#[async_trait]
pub trait RowExtractor: Send + Sync {
    /// Extrai as linhas brutas do arquivo
    ///
    /// # Parâmetros
    /// - file_path: caminho do arquivo de origem
    ///
    /// # Retorno
    /// - Ok(Extraction): linhas + ocorrências de extração
    /// - Err: problema estrutural do arquivo (rejeição total)
    async fn extract(&self, file_path: &Path) -> ImportResult<Extraction>;

    /// Origem que este extrator entende
    fn source(&self) -> ImportSource;
}

// ==========================================
// Extraction - Produto da extração
// ==========================================
#[derive(Debug, Clone)]
pub struct Extraction {
    pub rows: Vec<RawPieceRow>,   // linhas aproveitáveis, na ordem da origem
    pub issues: Vec<ImportIssue>, // ocorrências de arquivo (linha curta etc.)
    pub total_rows: usize,        // linhas de dados vistas na origem
    pub skipped_rows: usize,      // linhas descartadas com ocorrência
}

// ==========================================
// FieldValidator Trait
// ==========================================
// Uso: validação e normalização campo a campo (etapa 3)
// Implementador: FieldValidator (validator.rs)
pub trait FieldValidator: Send + Sync {
    /// Valida uma linha bruta e produz o registro normalizado
    ///
    /// Regra central: a validação nunca descarta a linha; ela anexa
    /// ocorrências e deixa a severidade decidir o destino.
    ///
    /// # Parâmetros
    /// - raw: linha bruta extraída
    /// - source: origem (muda a severidade de cliente ausente)
    ///
    /// # Retorno
    /// - RowValidation: registro normalizado + ocorrências da linha
    fn validate(&self, raw: &RawPieceRow, source: ImportSource) -> RowValidation;
}

// ==========================================
// RowValidation - Produto da validação
// ==========================================
#[derive(Debug, Clone)]
pub struct RowValidation {
    pub record: ImportRecord,     // campos normalizados
    pub issues: Vec<ImportIssue>, // ocorrências encontradas
}

// ==========================================
// DuplicateChecker Trait
// ==========================================
// Uso: detecção de código de barras repetido (etapa 4)
// Implementador: DuplicateChecker (duplicate_checker.rs)
pub trait DuplicateChecker: Send + Sync {
    /// Detecta códigos repetidos dentro do próprio lote
    ///
    /// A primeira aparição fica livre; as demais são apontadas.
    ///
    /// # Retorno
    /// - Vec<(índice, código)> das linhas repetidas
    fn find_file_duplicates(&self, records: &[StagedRecord]) -> Vec<(usize, String)>;

    /// Detecta códigos já cadastrados no espaço de trabalho
    ///
    /// # Parâmetros
    /// - records: linhas do lote
    /// - known: códigos já existentes (carregados uma vez por análise)
    ///
    /// # Retorno
    /// - Vec<(índice, código)> das linhas em conflito com o cadastro
    fn find_known_duplicates(
        &self,
        records: &[StagedRecord],
        known: &HashSet<String>,
    ) -> Vec<(usize, String)>;
}

// ==========================================
// Aggregator Trait
// ==========================================
// Uso: prévia agregada cliente -> projeto (etapa 5)
// Implementador: Aggregator (aggregator.rs)
pub trait Aggregator: Send + Sync {
    /// Agrega as linhas válidas por cliente e projeto
    ///
    /// Invariante: o resultado independe da ordem das linhas;
    /// reordenar o arquivo produz exatamente a mesma prévia.
    fn aggregate(&self, records: &[StagedRecord]) -> Vec<ClientPreviewGroup>;
}

// ==========================================
// PdfTextExtractor Trait
// ==========================================
// Uso: leitura posicionada de texto do PDF (apoio da etapa 2)
// Implementador: LopdfTextExtractor
//
// Separado do RowExtractor para permitir testar a montagem da
// grade sem um PDF real.
pub trait PdfTextExtractor: Send + Sync {
    /// Extrai os fragmentos de texto de cada página, com posição
    ///
    /// # Parâmetros
    /// - bytes: conteúdo do arquivo PDF
    ///
    /// # Retorno
    /// - Ok(Vec<PdfPageText>): páginas na ordem do documento
    /// - Err: PDF corrompido ou protegido por senha
    fn extract_pages(&self, bytes: &[u8]) -> ImportResult<Vec<PdfPageText>>;
}

// ==========================================
// PdfPageText - Texto posicionado de uma página
// ==========================================
#[derive(Debug, Clone)]
pub struct PdfPageText {
    pub number: u32,              // número da página (1-based)
    pub width: f64,               // largura da página (pontos)
    pub height: f64,              // altura da página (pontos)
    pub texts: Vec<PositionedText>,
}

// ==========================================
// PositionedText - Fragmento de texto com posição
// ==========================================
// Coordenadas no sistema do PDF: origem no canto inferior esquerdo
#[derive(Debug, Clone)]
pub struct PositionedText {
    pub x: f64,
    pub y: f64,
    pub text: String,
}
