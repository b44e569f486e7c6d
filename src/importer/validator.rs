// ==========================================
// Marcenaria Track - Validador de campos
// ==========================================
// Responsabilidade: normalizar e validar cada linha bruta
// Regra central: nunca descarta a linha; anexa ocorrências e a
// severidade decide o destino (Warning importa, Error exclui)
// ==========================================

use crate::domain::{
    normalize_barcode, ImportIssue, ImportRecord, ImportSource, IssueKind, RawPieceRow, RowLocator,
};
use crate::i18n;
use crate::importer::manifest_importer_trait::{
    FieldValidator as FieldValidatorTrait, RowValidation,
};

/// Tamanho mínimo do código de barras (depois do trim)
pub const MIN_BARCODE_LEN: usize = 3;

/// Tabela fixa campo -> tipo de ocorrência
///
/// Os nomes seguem os campos de origem exibidos ao operador.
pub fn issue_kind_for_field(field: &str) -> IssueKind {
    match field {
        "codigo" => IssueKind::InvalidBarcode,
        "cliente" => IssueKind::MissingClientInfo,
        "comprimento" | "largura" | "espessura" => IssueKind::InvalidMeasurement,
        _ => IssueKind::Generic,
    }
}

// ==========================================
// FieldValidator - Validador de linha
// ==========================================
pub struct FieldValidator {
    // Nome aplicado quando a etiqueta PDF não identifica o cliente
    default_client_name: String,
}

impl FieldValidator {
    pub fn new(default_client_name: String) -> Self {
        FieldValidator {
            default_client_name,
        }
    }
}

impl FieldValidatorTrait for FieldValidator {
    fn validate(&self, raw: &RawPieceRow, source: ImportSource) -> RowValidation {
        let mut issues = Vec::new();
        let locator = raw.locator;

        // === Código de barras ===
        let barcode = normalize_barcode(&raw.barcode);
        if barcode.chars().count() < MIN_BARCODE_LEN {
            let kind = issue_kind_for_field("codigo");
            issues.push(ImportIssue {
                kind,
                severity: kind.base_severity(source),
                field: Some("codigo".to_string()),
                locator,
                message: i18n::t_with_args(
                    "import.issue.invalid_barcode",
                    &[("value", raw.barcode.trim())],
                ),
                suggestion: Some(i18n::t("import.suggestion.invalid_barcode")),
            });
        }

        // === Cliente ===
        let mut client_name = raw.client_name.trim().to_string();
        if client_name.is_empty() {
            let kind = issue_kind_for_field("cliente");
            let severity = kind.base_severity(source);
            match source {
                ImportSource::HaixunCsv => {
                    let line = locator_number(locator);
                    issues.push(ImportIssue {
                        kind,
                        severity,
                        field: Some("cliente".to_string()),
                        locator,
                        message: i18n::t_with_args(
                            "import.issue.missing_client_csv",
                            &[("line", line.as_str())],
                        ),
                        suggestion: Some(i18n::t("import.suggestion.missing_client")),
                    });
                }
                ImportSource::PromobPdf => {
                    // Etiqueta sem cliente entra com o nome padrão
                    issues.push(ImportIssue {
                        kind,
                        severity,
                        field: Some("cliente".to_string()),
                        locator,
                        message: i18n::t_with_args(
                            "import.issue.missing_client_pdf",
                            &[("default", self.default_client_name.as_str())],
                        ),
                        suggestion: Some(i18n::t("import.suggestion.missing_client")),
                    });
                    client_name = self.default_client_name.clone();
                }
            }
        }

        // === Medidas ===
        let (dim_length, issue) = normalize_dimension(&raw.dim_length, "comprimento", locator, source);
        issues.extend(issue);
        let (dim_width, issue) = normalize_dimension(&raw.dim_width, "largura", locator, source);
        issues.extend(issue);
        let (dim_thickness, issue) =
            normalize_dimension(&raw.dim_thickness, "espessura", locator, source);
        issues.extend(issue);

        let record = ImportRecord {
            client_code: raw.client_code.trim().to_string(),
            client_name,
            project_name: raw.project_name.trim().to_string(),
            barcode,
            piece_module: raw.piece_module.trim().to_string(),
            piece_name: raw.piece_name.trim().to_string(),
            dim_length,
            dim_width,
            dim_thickness,
            material: raw.material.trim().to_string(),
            color: raw.color.trim().to_string(),
            locator,
        };

        RowValidation { record, issues }
    }
}

/// Normaliza uma medida para decimal com ponto
///
/// - vazio vira "0" sem ocorrência (peça sem medida existe)
/// - vírgula decimal vira ponto
/// - valor não numérico ou negativo vira "0" com Warning
fn normalize_dimension(
    value: &str,
    field: &'static str,
    locator: RowLocator,
    source: ImportSource,
) -> (String, Option<ImportIssue>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ("0".to_string(), None);
    }

    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.is_finite() => (normalized, None),
        _ => {
            let kind = issue_kind_for_field(field);
            (
                "0".to_string(),
                Some(ImportIssue {
                    kind,
                    severity: kind.base_severity(source),
                    field: Some(field.to_string()),
                    locator,
                    message: i18n::t_with_args(
                        "import.issue.invalid_measurement",
                        &[("field", field), ("value", trimmed)],
                    ),
                    suggestion: Some(i18n::t("import.suggestion.invalid_measurement")),
                }),
            )
        }
    }
}

/// Número da posição para mensagens (linha ou página)
fn locator_number(locator: RowLocator) -> String {
    match locator {
        RowLocator::Line(n) => n.to_string(),
        RowLocator::Page(p) => p.to_string(),
    }
}
