// ==========================================
// Marcenaria Track - API de bipagem
// ==========================================
// Responsabilidade: registrar a produção pela leitura do código de
// barras e devolver a mensagem pronta para a tela do galpão
// ==========================================

use crate::api::error::{validate_required_text, ApiResult};
use crate::domain::{normalize_barcode, ScanOutcome};
use crate::i18n::t_with_args;
use crate::repository::PieceRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Resultado de uma bipagem com a mensagem já localizada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub outcome: ScanOutcome,
    pub message: String,
}

// ==========================================
// ScanApi
// ==========================================
pub struct ScanApi {
    piece_repo: Arc<PieceRepository>,
    workspace_id: String,
}

impl ScanApi {
    pub fn new(piece_repo: Arc<PieceRepository>, workspace_id: String) -> Self {
        Self {
            piece_repo,
            workspace_id,
        }
    }

    /// Registra a bipagem de um código de barras
    ///
    /// A transição PENDING -> PRODUCED acontece no banco em uma única
    /// instrução; bipar o mesmo código duas vezes não altera o
    /// primeiro registro.
    ///
    /// # Parâmetros
    /// - barcode: código lido (é normalizado antes da busca)
    /// - operator: identificação de quem bipou
    pub fn scan_barcode(&self, barcode: &str, operator: &str) -> ApiResult<ScanResponse> {
        validate_required_text(barcode, "codigo")?;
        validate_required_text(operator, "operador")?;

        let outcome = self
            .piece_repo
            .mark_produced(&self.workspace_id, barcode, operator.trim())?;

        let message = match &outcome {
            ScanOutcome::Produced(piece) => {
                info!(barcode = %piece.barcode, operator = %operator.trim(), "peça produzida");
                t_with_args("scan.produced", &[("barcode", piece.barcode.as_str())])
            }
            ScanOutcome::AlreadyProduced(piece) => t_with_args(
                "scan.already_produced",
                &[("barcode", piece.barcode.as_str())],
            ),
            ScanOutcome::NotFound => {
                let normalized = normalize_barcode(barcode);
                t_with_args("scan.not_found", &[("barcode", normalized.as_str())])
            }
        };

        Ok(ScanResponse { outcome, message })
    }
}
