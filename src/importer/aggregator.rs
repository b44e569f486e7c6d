// ==========================================
// Marcenaria Track - Agregador da prévia
// ==========================================
// Responsabilidade: reduzir as linhas válidas ao resumo
// cliente -> projeto exibido na conferência
// Invariante: o resultado independe da ordem das linhas
// ==========================================

use crate::domain::{ClientPreviewGroup, ProjectPreview, StagedRecord};
use crate::importer::manifest_importer_trait::Aggregator as AggregatorTrait;
use std::collections::{BTreeMap, BTreeSet};

pub struct Aggregator;

#[derive(Default)]
struct ProjectAccum {
    piece_count: usize,
    modules: BTreeSet<String>,
}

struct ClientAccum {
    client_code: String,
    client_name: String,
    piece_count: usize,
    projects: BTreeMap<String, ProjectAccum>,
}

impl AggregatorTrait for Aggregator {
    /// Agrega as linhas válidas por cliente e projeto
    ///
    /// A chave do cliente é o código quando existe; sem código, o
    /// nome. Mapas ordenados (BTreeMap/BTreeSet) garantem que a
    /// prévia seja idêntica para qualquer permutação do arquivo.
    fn aggregate(&self, records: &[StagedRecord]) -> Vec<ClientPreviewGroup> {
        let mut clients: BTreeMap<String, ClientAccum> = BTreeMap::new();

        for staged in records.iter().filter(|r| r.valid) {
            let rec = &staged.record;
            let code = rec.client_code.trim();
            let key = if code.is_empty() {
                rec.client_name.clone()
            } else {
                code.to_string()
            };

            let entry = clients.entry(key).or_insert_with(|| ClientAccum {
                client_code: code.to_string(),
                client_name: rec.client_name.clone(),
                piece_count: 0,
                projects: BTreeMap::new(),
            });

            // Nome exibido: o menor lexicográfico não vazio, para o
            // resultado não depender de qual linha chegou primeiro
            if !rec.client_name.is_empty()
                && (entry.client_name.is_empty() || rec.client_name < entry.client_name)
            {
                entry.client_name = rec.client_name.clone();
            }

            entry.piece_count += 1;

            let project = entry
                .projects
                .entry(rec.project_name.clone())
                .or_default();
            project.piece_count += 1;
            if !rec.piece_module.is_empty() {
                project.modules.insert(rec.piece_module.clone());
            }
        }

        clients
            .into_iter()
            .map(|(key, acc)| ClientPreviewGroup {
                client_key: key,
                client_name: acc.client_name,
                client_code: acc.client_code,
                piece_count: acc.piece_count,
                projects: acc
                    .projects
                    .into_iter()
                    .map(|(name, p)| ProjectPreview {
                        project_name: name,
                        piece_count: p.piece_count,
                        modules: p.modules.into_iter().collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}
