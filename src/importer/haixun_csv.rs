// ==========================================
// Marcenaria Track - Extrator CSV (Haixun)
// ==========================================
// Origem: exportação da otimizadora/seccionadora Haixun
// Formato: CSV posicional SEM cabeçalho, 17+ colunas
// ==========================================

use crate::domain::{ImportIssue, ImportSource, IssueKind, RawPieceRow, RowLocator};
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::manifest_importer_trait::{Extraction, RowExtractor};
use async_trait::async_trait;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, warn};

/// Limite de tamanho do arquivo (10 MB)
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Mínimo de linhas de dados para o arquivo ser plausível
pub const MIN_DATA_ROWS: usize = 2;

/// Mínimo de colunas de uma linha aproveitável
pub const MIN_COLUMNS: usize = 17;

// Posições (0-based) dos campos na exportação Haixun
const COL_PIECE_NAME: usize = 1;
const COL_DIM_LENGTH: usize = 2;
const COL_DIM_WIDTH: usize = 3;
const COL_DIM_THICKNESS: usize = 4;
const COL_MATERIAL: usize = 5;
const COL_COLOR: usize = 6;
const COL_MODULE: usize = 7;
const COL_PROJECT: usize = 8;
const COL_BARCODE: usize = 11;
const COL_CLIENT_NAME: usize = 13;
const COL_CLIENT_CODE: usize = 16;

// Conteúdos da coluna de código que denunciam linha de cabeçalho
const HEADER_TOKENS: [&str; 4] = ["codigo", "código", "code", "barcode"];

// ==========================================
// HaixunCsvExtractor - Extrator do CSV Haixun
// ==========================================
pub struct HaixunCsvExtractor;

#[async_trait]
impl RowExtractor for HaixunCsvExtractor {
    /// Extrai as linhas brutas do CSV posicional
    ///
    /// # Regras
    /// - Arquivo acima de 10 MB é rejeitado inteiro
    /// - Menos de 2 linhas de dados: rejeitado inteiro
    /// - Linha de cabeçalho detectada: rejeitado inteiro
    /// - Linha ilegível para o parser: descartada com ocorrência Critical
    /// - Linha com menos de 17 colunas: descartada com Warning
    /// - Linha só de vírgulas: ignorada em silêncio
    async fn extract(&self, file_path: &Path) -> ImportResult<Extraction> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // Extensão diferente de .csv indica arquivo trocado
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedExtension(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let meta = tokio::fs::metadata(file_path).await?;
        if meta.len() > MAX_FILE_BYTES {
            return Err(ImportError::FileTooLarge {
                size: meta.len(),
                max: MAX_FILE_BYTES,
            });
        }

        let bytes = tokio::fs::read(file_path).await?;
        // Byte fora de UTF-8 não derruba o arquivo inteiro
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        // Materializa as linhas preservando o número físico de cada uma.
        // Linha ilegível vira ocorrência e não derruba o resto do arquivo.
        let mut data_rows: Vec<(usize, csv::StringRecord)> = Vec::new();
        let mut issues = Vec::new();
        let mut unparsable_rows = 0usize;
        for (idx, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    let line = err
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(idx + 1);
                    warn!(line, error = %err, "linha ilegível para o parser");
                    let line_s = line.to_string();
                    issues.push(ImportIssue {
                        kind: IssueKind::StructuralParse,
                        severity: IssueKind::StructuralParse
                            .base_severity(ImportSource::HaixunCsv),
                        field: None,
                        locator: RowLocator::Line(line),
                        message: i18n::t_with_args(
                            "import.issue.structural_parse",
                            &[("line", line_s.as_str())],
                        ),
                        suggestion: None,
                    });
                    unparsable_rows += 1;
                    continue;
                }
            };
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1);

            // Linha só de vírgulas não é linha de dados
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            data_rows.push((line, record));
        }

        if data_rows.len() < MIN_DATA_ROWS {
            return Err(ImportError::TooFewRows {
                rows: data_rows.len(),
                min: MIN_DATA_ROWS,
            });
        }

        // Guarda contra manifesto exportado com linha de cabeçalho
        if let Some((_, first)) = data_rows.first() {
            let probe = first.get(COL_BARCODE).unwrap_or("").trim().to_lowercase();
            if HEADER_TOKENS.contains(&probe.as_str()) {
                return Err(ImportError::HeaderRowDetected);
            }
        }

        let total_rows = data_rows.len() + unparsable_rows;
        let mut rows = Vec::new();
        let mut skipped_rows = unparsable_rows;

        for (line, record) in data_rows {
            if record.len() < MIN_COLUMNS {
                warn!(line, found = record.len(), "linha curta descartada");
                let line_s = line.to_string();
                let found_s = record.len().to_string();
                let required_s = MIN_COLUMNS.to_string();
                issues.push(ImportIssue {
                    kind: IssueKind::MissingRequiredColumn,
                    severity: IssueKind::MissingRequiredColumn
                        .base_severity(ImportSource::HaixunCsv),
                    field: None,
                    locator: RowLocator::Line(line),
                    message: i18n::t_with_args(
                        "import.issue.missing_columns",
                        &[
                            ("line", line_s.as_str()),
                            ("found", found_s.as_str()),
                            ("required", required_s.as_str()),
                        ],
                    ),
                    suggestion: Some(i18n::t("import.suggestion.missing_columns")),
                });
                skipped_rows += 1;
                continue;
            }

            let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();

            let mut raw = RawPieceRow::empty(RowLocator::Line(line));
            raw.piece_name = cell(COL_PIECE_NAME);
            raw.dim_length = cell(COL_DIM_LENGTH);
            raw.dim_width = cell(COL_DIM_WIDTH);
            raw.dim_thickness = cell(COL_DIM_THICKNESS);
            raw.material = cell(COL_MATERIAL);
            raw.color = cell(COL_COLOR);
            raw.piece_module = cell(COL_MODULE);
            raw.project_name = cell(COL_PROJECT);
            raw.barcode = cell(COL_BARCODE);
            raw.client_name = cell(COL_CLIENT_NAME);
            raw.client_code = cell(COL_CLIENT_CODE);
            rows.push(raw);
        }

        debug!(
            total = total_rows,
            extracted = rows.len(),
            skipped = skipped_rows,
            "extração do CSV concluída"
        );

        Ok(Extraction {
            rows,
            issues,
            total_rows,
            skipped_rows,
        })
    }

    fn source(&self) -> ImportSource {
        ImportSource::HaixunCsv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueSeverity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ROW_A: &str = "0,Porta Superior,500,300,18,MDF,Branco TX,Cozinha Mod A,Cozinha-A,,,BC123,,Acme Moveis,,,C001";
    const ROW_B: &str = "0,Lateral Esquerda,720,450,15,MDP,Carvalho,Cozinha Mod A,Cozinha-A,,,BC124,,Acme Moveis,,,C001";

    fn write_manifest(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_extract_reads_mapped_columns() {
        let file = write_manifest(&[ROW_A, ROW_B]);
        let extraction = HaixunCsvExtractor.extract(file.path()).await.unwrap();

        assert_eq!(extraction.total_rows, 2);
        assert_eq!(extraction.rows.len(), 2);
        assert_eq!(extraction.skipped_rows, 0);
        assert!(extraction.issues.is_empty());

        let first = &extraction.rows[0];
        assert_eq!(first.piece_name, "Porta Superior");
        assert_eq!(first.dim_length, "500");
        assert_eq!(first.dim_width, "300");
        assert_eq!(first.dim_thickness, "18");
        assert_eq!(first.material, "MDF");
        assert_eq!(first.color, "Branco TX");
        assert_eq!(first.piece_module, "Cozinha Mod A");
        assert_eq!(first.project_name, "Cozinha-A");
        assert_eq!(first.barcode, "BC123");
        assert_eq!(first.client_name, "Acme Moveis");
        assert_eq!(first.client_code, "C001");
        assert_eq!(first.locator, RowLocator::Line(1));
    }

    #[tokio::test]
    async fn test_short_row_is_skipped_with_warning() {
        // Linha com 10 colunas no meio do arquivo
        let short = "0,Porta,500,300,18,MDF,Branco,Mod,Proj,sobrando";
        let file = write_manifest(&[ROW_A, short, ROW_B]);
        let extraction = HaixunCsvExtractor.extract(file.path()).await.unwrap();

        assert_eq!(extraction.total_rows, 3);
        assert_eq!(extraction.rows.len(), 2);
        assert_eq!(extraction.skipped_rows, 1);
        assert_eq!(extraction.issues.len(), 1);

        let issue = &extraction.issues[0];
        assert_eq!(issue.kind, IssueKind::MissingRequiredColumn);
        assert_eq!(issue.severity, IssueSeverity::Warning);
        assert_eq!(issue.locator, RowLocator::Line(2));
    }

    #[tokio::test]
    async fn test_header_row_rejected() {
        let header = "num,peca,comp,larg,esp,material,cor,modulo,ambiente,a,b,Codigo,c,cliente,d,e,ordem";
        let file = write_manifest(&[header, ROW_A, ROW_B]);
        let result = HaixunCsvExtractor.extract(file.path()).await;
        assert!(matches!(result, Err(ImportError::HeaderRowDetected)));
    }

    #[tokio::test]
    async fn test_too_few_rows_rejected() {
        let file = write_manifest(&[ROW_A]);
        let result = HaixunCsvExtractor.extract(file.path()).await;
        assert!(matches!(
            result,
            Err(ImportError::TooFewRows { rows: 1, min: 2 })
        ));
    }

    #[tokio::test]
    async fn test_file_not_found() {
        let result = HaixunCsvExtractor
            .extract(Path::new("/tmp/nao_existe_manifesto.csv"))
            .await;
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_comma_rows_ignored() {
        // Linha só de vírgulas não conta como linha de dados
        let blank = ",,,,,,,,,,,,,,,,";
        let file = write_manifest(&[ROW_A, blank, ROW_B]);
        let extraction = HaixunCsvExtractor.extract(file.path()).await.unwrap();

        assert_eq!(extraction.total_rows, 2);
        assert_eq!(extraction.rows.len(), 2);
        assert!(extraction.issues.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "{}", ROW_A).unwrap();
        writeln!(file, "{}", ROW_B).unwrap();

        let result = HaixunCsvExtractor.extract(file.path()).await;
        assert!(matches!(result, Err(ImportError::UnsupportedExtension(_))));
    }
}
