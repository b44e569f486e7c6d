// ==========================================
// Marcenaria Track - Detector de duplicidade
// ==========================================
// Responsabilidade: apontar códigos de barras repetidos, sem
// alterar as linhas (quem marca a ocorrência é o orquestrador)
// ==========================================

use crate::domain::StagedRecord;
use crate::importer::manifest_importer_trait::DuplicateChecker as DuplicateCheckerTrait;
use std::collections::{HashMap, HashSet};

pub struct DuplicateChecker;

impl DuplicateCheckerTrait for DuplicateChecker {
    /// Detecta códigos repetidos dentro do lote
    ///
    /// # Retorno
    /// - Vec<(índice, código)>: repetições (a primeira aparição fica de fora)
    fn find_file_duplicates(&self, records: &[StagedRecord]) -> Vec<(usize, String)> {
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for staged in records {
            let barcode = staged.record.barcode.as_str();
            // Código vazio já foi apontado pela validação
            if barcode.is_empty() {
                continue;
            }
            if first_occurrence.contains_key(barcode) {
                duplicates.push((staged.index, barcode.to_string()));
            } else {
                first_occurrence.insert(barcode, staged.index);
            }
        }

        duplicates
    }

    /// Detecta códigos já cadastrados no espaço de trabalho
    ///
    /// # Parâmetros
    /// - records: linhas do lote
    /// - known: códigos existentes no banco (normalizados)
    ///
    /// # Retorno
    /// - Vec<(índice, código)>: linhas em conflito com o cadastro
    fn find_known_duplicates(
        &self,
        records: &[StagedRecord],
        known: &HashSet<String>,
    ) -> Vec<(usize, String)> {
        let mut duplicates = Vec::new();

        for staged in records {
            let barcode = staged.record.barcode.as_str();
            if barcode.is_empty() {
                continue;
            }
            if known.contains(barcode) {
                duplicates.push((staged.index, barcode.to_string()));
            }
        }

        duplicates
    }
}
