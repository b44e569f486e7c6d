// ==========================================
// Marcenaria Track - Extrator PDF (Promob)
// ==========================================
// Origem: folhas de etiquetas geradas pelo Promob
// Layout: grade fixa de 2 colunas x 4 linhas por página
// Idioma: rótulos em português ou inglês, conforme a instalação
// ==========================================

use crate::domain::{ImportSource, RawPieceRow, RowLocator};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::manifest_importer_trait::{
    Extraction, PdfPageText, PdfTextExtractor, PositionedText, RowExtractor,
};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use tracing::debug;

// Geometria da grade de etiquetas
const GRID_COLS: usize = 2;
const GRID_ROWS: usize = 4;

// Fragmentos com y a menos de 2pt um do outro pertencem à mesma linha
const LINE_TOLERANCE: f64 = 2.0;

// ==========================================
// LabelPatterns - Rótulos bilíngues da etiqueta
// ==========================================
struct LabelPatterns {
    client: Regex,
    project: Regex,
    module: Regex,
    piece: Regex,
    barcode: Regex,
    measures: Regex,
    material: Regex,
    color: Regex,
}

impl LabelPatterns {
    fn new() -> Self {
        // Padrões literais; Regex::new não falha com eles
        LabelPatterns {
            client: Regex::new(r"(?i)^\s*(?:cliente|client)\s*:\s*(.*)$").unwrap(),
            project: Regex::new(r"(?i)^\s*(?:ambiente|project)\s*:\s*(.*)$").unwrap(),
            module: Regex::new(r"(?i)^\s*(?:m[óo]dulo|module)\s*:\s*(.*)$").unwrap(),
            piece: Regex::new(r"(?i)^\s*(?:pe[çc]a|piece)\s*:\s*(.*)$").unwrap(),
            barcode: Regex::new(r"(?i)^\s*(?:c[óo]digo|code)\s*:\s*(.*)$").unwrap(),
            measures: Regex::new(r"(?i)^\s*(?:medidas|size)\s*:\s*(.*)$").unwrap(),
            material: Regex::new(r"(?i)^\s*material\s*:\s*(.*)$").unwrap(),
            color: Regex::new(r"(?i)^\s*(?:cor|color)\s*:\s*(.*)$").unwrap(),
        }
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

// ==========================================
// PromobPdfExtractor - Extrator das etiquetas
// ==========================================
pub struct PromobPdfExtractor {
    text_extractor: Box<dyn PdfTextExtractor>,
    patterns: LabelPatterns,
}

impl PromobPdfExtractor {
    pub fn new(text_extractor: Box<dyn PdfTextExtractor>) -> Self {
        PromobPdfExtractor {
            text_extractor,
            patterns: LabelPatterns::new(),
        }
    }

    /// Interpreta as linhas de uma célula da grade
    ///
    /// # Retorno
    /// - Some(RawPieceRow): célula com conteúdo identificador
    /// - None: célula sem código e sem peça (em branco ou decorativa,
    ///   descartada em silêncio, sem ocorrência)
    fn parse_cell(&self, lines: &[String], page: u32) -> Option<RawPieceRow> {
        let mut raw = RawPieceRow::empty(RowLocator::Page(page));

        for line in lines {
            if let Some(v) = capture(&self.patterns.client, line) {
                raw.client_name = v;
            } else if let Some(v) = capture(&self.patterns.project, line) {
                raw.project_name = v;
            } else if let Some(v) = capture(&self.patterns.module, line) {
                raw.piece_module = v;
            } else if let Some(v) = capture(&self.patterns.piece, line) {
                raw.piece_name = v;
            } else if let Some(v) = capture(&self.patterns.barcode, line) {
                raw.barcode = v;
            } else if let Some(v) = capture(&self.patterns.measures, line) {
                apply_measures(&mut raw, &v);
            } else if let Some(v) = capture(&self.patterns.material, line) {
                raw.material = v;
            } else if let Some(v) = capture(&self.patterns.color, line) {
                raw.color = v;
            }
            // Linha sem rótulo conhecido (logo, numeração) é ignorada
        }

        // Sem código e sem peça não há o que rastrear: a célula é um
        // espaço da grade ou um rodapé que por acaso casa com um rótulo
        if raw.barcode.is_empty() && raw.piece_name.is_empty() {
            return None;
        }
        Some(raw)
    }
}

/// Divide "C x L x E" nas três medidas da peça
///
/// Valor fora do formato fica inteiro no comprimento; a validação
/// aponta a medida inválida depois.
fn apply_measures(raw: &mut RawPieceRow, value: &str) {
    let parts: Vec<&str> = value
        .split(|c| c == 'x' || c == 'X' || c == '×')
        .map(str::trim)
        .collect();
    if parts.len() == 3 {
        raw.dim_length = parts[0].to_string();
        raw.dim_width = parts[1].to_string();
        raw.dim_thickness = parts[2].to_string();
    } else {
        raw.dim_length = value.trim().to_string();
    }
}

/// Célula da grade a que o fragmento pertence (linha, coluna)
///
/// O y do PDF cresce para cima, então a linha 0 é o topo da página.
fn cell_of(page: &PdfPageText, frag: &PositionedText) -> (usize, usize) {
    let col = if frag.x < page.width / 2.0 { 0 } else { 1 };
    let cell_h = page.height / GRID_ROWS as f64;
    let row_f = ((page.height - frag.y) / cell_h).floor();
    let row = row_f.max(0.0).min((GRID_ROWS - 1) as f64) as usize;
    (row, col)
}

/// Monta as linhas de texto de uma célula
///
/// Fragmentos na mesma altura são emendados em ordem de x (o rótulo
/// e o valor costumam sair em operações separadas).
fn cell_lines(fragments: &mut [&PositionedText]) -> Vec<String> {
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<String> = Vec::new();
    let mut last_y = f64::INFINITY;
    for frag in fragments.iter() {
        if (last_y - frag.y).abs() > LINE_TOLERANCE {
            lines.push(frag.text.trim().to_string());
            last_y = frag.y;
        } else if let Some(current) = lines.last_mut() {
            current.push(' ');
            current.push_str(frag.text.trim());
        }
    }
    lines
}

#[async_trait]
impl RowExtractor for PromobPdfExtractor {
    /// Extrai uma linha bruta por etiqueta preenchida
    ///
    /// # Regras
    /// - PDF corrompido ou protegido por senha: rejeição total
    /// - Célula em branco da grade: descartada em silêncio
    /// - Páginas na ordem do documento; células em ordem de leitura
    async fn extract(&self, file_path: &Path) -> ImportResult<Extraction> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("pdf") {
                return Err(ImportError::UnsupportedExtension(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let bytes = tokio::fs::read(file_path).await?;
        let pages = self.text_extractor.extract_pages(&bytes)?;

        let mut rows = Vec::new();
        for page in &pages {
            // Particiona os fragmentos nas células da grade
            let mut cells: Vec<Vec<&PositionedText>> = vec![Vec::new(); GRID_ROWS * GRID_COLS];
            for frag in &page.texts {
                let (row, col) = cell_of(page, frag);
                cells[row * GRID_COLS + col].push(frag);
            }

            // Ordem de leitura: esquerda -> direita, cima -> baixo
            for cell in cells.iter_mut() {
                if cell.is_empty() {
                    continue;
                }
                let lines = cell_lines(cell);
                if let Some(raw) = self.parse_cell(&lines, page.number) {
                    rows.push(raw);
                }
            }
        }

        let total_rows = rows.len();
        debug!(
            pages = pages.len(),
            labels = total_rows,
            "extração do PDF concluída"
        );

        Ok(Extraction {
            rows,
            issues: Vec::new(),
            total_rows,
            skipped_rows: 0,
        })
    }

    fn source(&self) -> ImportSource {
        ImportSource::PromobPdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Extrator de texto fixo: devolve as páginas fabricadas no teste
    struct FixedPages(Vec<PdfPageText>);

    impl PdfTextExtractor for FixedPages {
        fn extract_pages(&self, _bytes: &[u8]) -> ImportResult<Vec<PdfPageText>> {
            Ok(self.0.clone())
        }
    }

    fn page(number: u32, texts: Vec<(f64, f64, &str)>) -> PdfPageText {
        PdfPageText {
            number,
            width: 595.0,
            height: 842.0,
            texts: texts
                .into_iter()
                .map(|(x, y, t)| PositionedText {
                    x,
                    y,
                    text: t.to_string(),
                })
                .collect(),
        }
    }

    fn pdf_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        // O conteúdo não importa: o extrator de texto é o stub
        file.write_all(b"stub").unwrap();
        file
    }

    async fn run(pages: Vec<PdfPageText>) -> Extraction {
        let extractor = PromobPdfExtractor::new(Box::new(FixedPages(pages)));
        extractor.extract(pdf_file().path()).await.unwrap()
    }

    #[tokio::test]
    async fn test_cells_read_in_reading_order() {
        // Três etiquetas: topo-esquerda, topo-direita, segunda linha à esquerda
        let pages = vec![page(
            1,
            vec![
                (320.0, 800.0, "Peça: Beta"),
                (20.0, 500.0, "Peça: Gama"),
                (20.0, 800.0, "Peça: Acme"),
            ],
        )];
        let extraction = run(pages).await;

        assert_eq!(extraction.rows.len(), 3);
        assert_eq!(extraction.rows[0].piece_name, "Acme");
        assert_eq!(extraction.rows[1].piece_name, "Beta");
        assert_eq!(extraction.rows[2].piece_name, "Gama");
        assert_eq!(extraction.rows[0].locator, RowLocator::Page(1));
    }

    #[tokio::test]
    async fn test_blank_cells_silently_dropped() {
        // Só uma das oito células tem conteúdo
        let pages = vec![page(1, vec![(20.0, 800.0, "Peça: Porta Superior")])];
        let extraction = run(pages).await;

        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.total_rows, 1);
        assert_eq!(extraction.skipped_rows, 0);
        assert!(extraction.issues.is_empty());
    }

    #[tokio::test]
    async fn test_full_label_parsed() {
        let pages = vec![page(
            1,
            vec![
                (20.0, 820.0, "Cliente: Acme Móveis"),
                (20.0, 806.0, "Ambiente: Cozinha-A"),
                (20.0, 792.0, "Módulo: Cozinha Mod A"),
                (20.0, 778.0, "Peça: Porta Superior"),
                (20.0, 764.0, "Código: BC123"),
                (20.0, 750.0, "Medidas: 500 x 300 x 18"),
                (20.0, 736.0, "Material: MDF"),
                (20.0, 722.0, "Cor: Branco TX"),
            ],
        )];
        let extraction = run(pages).await;

        assert_eq!(extraction.rows.len(), 1);
        let raw = &extraction.rows[0];
        assert_eq!(raw.client_name, "Acme Móveis");
        assert_eq!(raw.project_name, "Cozinha-A");
        assert_eq!(raw.piece_module, "Cozinha Mod A");
        assert_eq!(raw.piece_name, "Porta Superior");
        assert_eq!(raw.barcode, "BC123");
        assert_eq!(raw.dim_length, "500");
        assert_eq!(raw.dim_width, "300");
        assert_eq!(raw.dim_thickness, "18");
        assert_eq!(raw.material, "MDF");
        assert_eq!(raw.color, "Branco TX");
    }

    #[tokio::test]
    async fn test_english_labels_parsed() {
        let pages = vec![page(
            1,
            vec![
                (20.0, 820.0, "Client: Acme"),
                (20.0, 806.0, "Project: Kitchen-A"),
                (20.0, 792.0, "Module: Kitchen Mod A"),
                (20.0, 778.0, "Piece: Upper Door"),
                (20.0, 764.0, "Code: BC123"),
                (20.0, 750.0, "Size: 720x450x15"),
            ],
        )];
        let extraction = run(pages).await;

        let raw = &extraction.rows[0];
        assert_eq!(raw.client_name, "Acme");
        assert_eq!(raw.project_name, "Kitchen-A");
        assert_eq!(raw.barcode, "BC123");
        // Medidas sem espaços também dividem
        assert_eq!(raw.dim_length, "720");
        assert_eq!(raw.dim_width, "450");
        assert_eq!(raw.dim_thickness, "15");
    }

    #[tokio::test]
    async fn test_split_fragments_joined_into_line() {
        // Rótulo e valor saem em operações separadas na mesma altura
        let pages = vec![page(
            1,
            vec![(20.0, 800.0, "Peça:"), (80.0, 800.0, "Porta Superior")],
        )];
        let extraction = run(pages).await;

        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.rows[0].piece_name, "Porta Superior");
    }

    #[tokio::test]
    async fn test_cell_without_code_or_piece_dropped() {
        // Rodapé que casa com rótulos conhecidos mas não identifica peça
        let pages = vec![page(
            1,
            vec![
                (20.0, 800.0, "Cliente: Acme Móveis"),
                (20.0, 786.0, "Material: consulte a etiqueta"),
            ],
        )];
        let extraction = run(pages).await;

        assert!(extraction.rows.is_empty());
        assert!(extraction.issues.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_measures_kept_for_validation() {
        let pages = vec![page(
            1,
            vec![
                (20.0, 800.0, "Peça: Porta"),
                (20.0, 786.0, "Medidas: quinhentos"),
            ],
        )];
        let extraction = run(pages).await;

        // O valor fora do formato vai inteiro para o comprimento;
        // a validação decide o que fazer com ele
        assert_eq!(extraction.rows[0].dim_length, "quinhentos");
        assert_eq!(extraction.rows[0].dim_width, "");
    }

    #[tokio::test]
    async fn test_unlabelled_text_ignored() {
        let pages = vec![page(
            1,
            vec![
                (20.0, 820.0, "Promob Etiquetas v3"),
                (20.0, 100.0, "www.exemplo.com.br"),
            ],
        )];
        let extraction = run(pages).await;

        // Texto sem rótulo conhecido não vira etiqueta
        assert!(extraction.rows.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected() {
        let extractor = PromobPdfExtractor::new(Box::new(FixedPages(vec![])));
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"stub").unwrap();

        let result = extractor.extract(file.path()).await;
        assert!(matches!(result, Err(ImportError::UnsupportedExtension(_))));
    }
}
