// ==========================================
// Marcenaria Track - Orquestrador da importação
// ==========================================
// Responsabilidade: conduzir as 6 etapas da análise, guardar o lote
// preparado e gravar tudo na confirmação
// Restrição: uma análise/confirmação por vez; chamada concorrente
// devolve Ok(None) sem efeito colateral
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{
    piece_id, project_id, AnalyzeReport, ClientPreviewGroup, CommitReport, ImportBatch,
    ImportIssue, ImportSource, IssueKind, IssueSeverity, Piece, PieceStatus, Project, RecordEdit,
    RowLocator, StagedRecord,
};
use crate::i18n::{t, t_with_args};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::manifest_importer_trait::{
    Aggregator, DuplicateChecker, FieldValidator, ManifestImporter, RowExtractor,
};
use crate::repository::ImportRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Ocorrência de código repetido, pronta para anexar à linha
fn duplicate_issue(locator: RowLocator, barcode: &str, message_key: &str) -> ImportIssue {
    let kind = IssueKind::DuplicateBarcode;
    ImportIssue {
        kind,
        // Duplicidade só é marcada na origem PDF
        severity: kind.base_severity(ImportSource::PromobPdf),
        field: Some("codigo".to_string()),
        locator,
        message: t_with_args(message_key, &[("barcode", barcode)]),
        suggestion: Some(t("import.suggestion.duplicate")),
    }
}

// ==========================================
// StagedImport - Lote preparado em memória
// ==========================================
// Invariante: records preserva a ordem da origem e nunca perde
// linhas; o índice de cada StagedRecord coincide com a posição.
#[derive(Clone)]
struct StagedImport {
    batch_id: String,
    source: ImportSource,
    file_name: String,
    total_rows: usize,
    skipped_rows: usize,
    run_issues: Vec<ImportIssue>, // ocorrências de arquivo (linha curta etc.)
    records: Vec<StagedRecord>,
    known_barcodes: HashSet<String>, // fotografia do cadastro na análise
    preview: Vec<ClientPreviewGroup>,
}

// ==========================================
// RunGuard - Exclusão de operação em andamento
// ==========================================
// Libera a flag no drop, inclusive em retorno por erro.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    /// Tenta marcar a operação como em andamento
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ==========================================
// ManifestImporterImpl - Implementação do importador
// ==========================================
pub struct ManifestImporterImpl<R: ImportRepository, C: ImportConfigReader> {
    import_repo: R,
    config: C,
    csv_extractor: Box<dyn RowExtractor>,
    pdf_extractor: Box<dyn RowExtractor>,
    validator: Box<dyn FieldValidator>,
    duplicate_checker: Box<dyn DuplicateChecker>,
    aggregator: Box<dyn Aggregator>,
    in_flight: AtomicBool,
    staged: Mutex<Option<StagedImport>>,
}

impl<R: ImportRepository, C: ImportConfigReader> ManifestImporterImpl<R, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        import_repo: R,
        config: C,
        csv_extractor: Box<dyn RowExtractor>,
        pdf_extractor: Box<dyn RowExtractor>,
        validator: Box<dyn FieldValidator>,
        duplicate_checker: Box<dyn DuplicateChecker>,
        aggregator: Box<dyn Aggregator>,
    ) -> Self {
        Self {
            import_repo,
            config,
            csv_extractor,
            pdf_extractor,
            validator,
            duplicate_checker,
            aggregator,
            in_flight: AtomicBool::new(false),
            staged: Mutex::new(None),
        }
    }

    /// Obtém o lote preparado com a trava
    fn lock_staged(&self) -> ImportResult<MutexGuard<'_, Option<StagedImport>>> {
        self.staged
            .lock()
            .map_err(|e| ImportError::Other(anyhow::anyhow!("trava do lote envenenada: {}", e)))
    }

    /// Escolhe o extrator pela extensão do arquivo
    fn extractor_for(&self, path: &Path) -> ImportResult<&dyn RowExtractor> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(self.csv_extractor.as_ref()),
            "pdf" => Ok(self.pdf_extractor.as_ref()),
            _ => Err(ImportError::UnsupportedExtension(
                path.display().to_string(),
            )),
        }
    }

    /// Anexa ocorrências de duplicidade (arquivo, depois cadastro)
    ///
    /// O checker devolve o índice estável da linha; como o lote nunca
    /// perde linhas, índice e posição coincidem.
    fn mark_duplicates(&self, records: &mut [StagedRecord], known: &HashSet<String>) {
        for (index, barcode) in self.duplicate_checker.find_file_duplicates(records) {
            if let Some(record) = records.get_mut(index) {
                let issue =
                    duplicate_issue(record.record.locator, &barcode, "import.issue.duplicate_in_file");
                record.issues.push(issue);
            }
        }
        for (index, barcode) in self.duplicate_checker.find_known_duplicates(records, known) {
            if let Some(record) = records.get_mut(index) {
                let issue = duplicate_issue(
                    record.record.locator,
                    &barcode,
                    "import.issue.duplicate_in_store",
                );
                record.issues.push(issue);
            }
        }
    }

    /// Todas as ocorrências do lote: arquivo + linhas, na ordem da origem
    fn collect_issues(staged: &StagedImport) -> Vec<ImportIssue> {
        let mut issues = staged.run_issues.clone();
        issues.extend(staged.records.iter().flat_map(|r| r.issues.iter().cloned()));
        issues
    }

    /// Fotografia do lote no formato exibido pela tela de conferência
    fn build_report(staged: &StagedImport) -> AnalyzeReport {
        let issues = Self::collect_issues(staged);
        let valid_count = staged.records.iter().filter(|r| r.valid).count();
        let error_count = issues
            .iter()
            .filter(|i| i.severity >= IssueSeverity::Error)
            .count();
        let warning_count = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count();

        let valid_text = valid_count.to_string();
        let total_text = staged.total_rows.to_string();
        let message = t_with_args(
            "import.analyzed",
            &[("valid", valid_text.as_str()), ("total", total_text.as_str())],
        );

        AnalyzeReport {
            batch_id: staged.batch_id.clone(),
            source: staged.source,
            file_name: staged.file_name.clone(),
            total_rows: staged.total_rows,
            skipped_rows: staged.skipped_rows,
            valid_count,
            error_count,
            warning_count,
            issues,
            records: staged.records.clone(),
            preview: staged.preview.clone(),
            message,
        }
    }
}

// ==========================================
// Implementação do trait ManifestImporter
// ==========================================
#[async_trait::async_trait]
impl<R, C> ManifestImporter for ManifestImporterImpl<R, C>
where
    R: ImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn analyze<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<Option<AnalyzeReport>> {
        let _run = match RunGuard::try_acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!("análise ignorada: outra operação de importação em andamento");
                return Ok(None);
            }
        };
        let start_time = Instant::now();
        let path = file_path.as_ref();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        // Uma nova análise substitui qualquer lote anterior
        self.lock_staged()?.take();

        // === Etapa 1: seleção do extrator pela extensão ===
        let extractor = self.extractor_for(path)?;
        let source = extractor.source();
        debug!(%source, file = %path.display(), "iniciando análise do manifesto");

        // === Etapa 2: extração das linhas brutas ===
        let extraction = extractor.extract(path).await.map_err(|e| {
            error!(error = %e, "falha na extração do manifesto");
            e
        })?;
        info!(
            total_rows = extraction.total_rows,
            skipped_rows = extraction.skipped_rows,
            "extração concluída"
        );

        // === Etapa 3: validação campo a campo ===
        let mut records: Vec<StagedRecord> = extraction
            .rows
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let validation = self.validator.validate(raw, source);
                let mut staged = StagedRecord {
                    index,
                    raw: raw.clone(),
                    record: validation.record,
                    issues: validation.issues,
                    valid: false,
                };
                staged.recompute_valid();
                staged
            })
            .collect();

        // === Etapa 4: duplicidade (somente origem PDF) ===
        let known_barcodes = if source == ImportSource::PromobPdf {
            let workspace_id = self.config.workspace_id().await?;
            let known = self.import_repo.load_piece_barcodes(&workspace_id).await?;
            self.mark_duplicates(&mut records, &known);
            for record in records.iter_mut() {
                record.recompute_valid();
            }
            known
        } else {
            // No CSV a regravação do mesmo código é proposital
            // (reimportação sobrescreve o cadastro)
            debug!("verificação de duplicidade dispensada para a origem CSV");
            HashSet::new()
        };

        // === Etapa 5: rejeição de lote sem linha válida ===
        let valid_count = records.iter().filter(|r| r.valid).count();
        if valid_count == 0 {
            let mut issues = extraction.issues.clone();
            issues.extend(records.iter().flat_map(|r| r.issues.iter().cloned()));
            warn!(
                row_count = extraction.total_rows,
                "nenhuma linha válida; lote rejeitado"
            );
            return Err(ImportError::NoValidRecords {
                row_count: extraction.total_rows,
                issues,
            });
        }

        // === Etapa 6: agregação e montagem da prévia ===
        let preview = self.aggregator.aggregate(&records);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("desconhecido")
            .to_string();

        let staged = StagedImport {
            batch_id,
            source,
            file_name,
            total_rows: extraction.total_rows,
            skipped_rows: extraction.skipped_rows,
            run_issues: extraction.issues,
            records,
            known_barcodes,
            preview,
        };
        let report = Self::build_report(&staged);
        *self.lock_staged()? = Some(staged);

        info!(
            valid = report.valid_count,
            errors = report.error_count,
            warnings = report.warning_count,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "análise concluída; lote aguardando confirmação"
        );
        Ok(Some(report))
    }

    #[instrument(skip(self), fields(batch_id))]
    async fn confirm(&self, operator: &str) -> ImportResult<Option<CommitReport>> {
        let _run = match RunGuard::try_acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!("confirmação ignorada: outra operação de importação em andamento");
                return Ok(None);
            }
        };
        let start_time = Instant::now();

        // Clona o lote para fora da trava: nenhum guard atravessa await
        let staged = match self.lock_staged()?.clone() {
            Some(staged) => staged,
            None => {
                debug!("confirmação sem lote preparado; nada a fazer");
                return Ok(None);
            }
        };
        tracing::Span::current().record("batch_id", staged.batch_id.as_str());

        let valid_records: Vec<&StagedRecord> =
            staged.records.iter().filter(|r| r.valid).collect();
        if valid_records.is_empty() {
            // Edições na conferência podem ter invalidado todas as linhas
            return Err(ImportError::NoValidRecords {
                row_count: staged.total_rows,
                issues: Self::collect_issues(&staged),
            });
        }

        let workspace_id = self.config.workspace_id().await?;
        let now = Utc::now();

        // Monta projetos (deduplicados pelo id determinístico) e peças
        let mut projects: Vec<Project> = Vec::new();
        let mut seen_projects: HashSet<String> = HashSet::new();
        let mut pieces: Vec<Piece> = Vec::with_capacity(valid_records.len());
        for staged_record in &valid_records {
            let record = &staged_record.record;
            let record_project_id = project_id(
                &workspace_id,
                &record.client_code,
                &record.client_name,
                &record.project_name,
            );
            if seen_projects.insert(record_project_id.clone()) {
                projects.push(Project {
                    project_id: record_project_id.clone(),
                    workspace_id: workspace_id.clone(),
                    name: record.project_name.clone(),
                    client_name: record.client_name.clone(),
                    client_code: record.client_code.clone(),
                    status: "ACTIVE".to_string(),
                    created_at: now,
                    updated_at: now,
                });
            }
            pieces.push(Piece {
                piece_id: piece_id(&workspace_id, &record.barcode),
                workspace_id: workspace_id.clone(),
                barcode: record.barcode.clone(),
                piece_name: record.piece_name.clone(),
                piece_module: record.piece_module.clone(),
                dimensions: record.dimensions(),
                material: record.material.clone(),
                color: record.color.clone(),
                project_id: record_project_id,
                project_name: record.project_name.clone(),
                client_code: record.client_code.clone(),
                client_name: record.client_name.clone(),
                status: PieceStatus::Pending,
                produced_at: None,
                produced_by: None,
                created_at: now,
                updated_at: now,
            });
        }

        let issues = Self::collect_issues(&staged);
        let batch = ImportBatch {
            batch_id: staged.batch_id.clone(),
            workspace_id,
            source: staged.source,
            file_name: Some(staged.file_name.clone()),
            total_rows: staged.total_rows as i32,
            valid_rows: pieces.len() as i32,
            skipped_rows: staged.skipped_rows as i32,
            error_count: issues
                .iter()
                .filter(|i| i.severity >= IssueSeverity::Error)
                .count() as i32,
            warning_count: issues
                .iter()
                .filter(|i| i.severity == IssueSeverity::Warning)
                .count() as i32,
            committed_at: Some(now),
            committed_by: Some(operator.to_string()),
        };

        let stats = self
            .import_repo
            .commit_batch(&batch, &projects, &pieces)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    "falha na gravação do lote; o lote preparado foi mantido para nova tentativa"
                );
                e
            })?;

        // Gravou: o staging pode ser descartado
        match self.staged.lock() {
            Ok(mut guard) => {
                guard.take();
            }
            Err(e) => warn!(error = %e, "trava do lote envenenada após a gravação"),
        }

        let pieces_text = stats.pieces_written.to_string();
        let clients_text = staged.preview.len().to_string();
        let message = t_with_args(
            "import.committed",
            &[
                ("pieces", pieces_text.as_str()),
                ("clients", clients_text.as_str()),
            ],
        );

        info!(
            pieces = stats.pieces_written,
            projects = stats.projects_written,
            clients = staged.preview.len(),
            operator,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "lote confirmado e gravado"
        );

        Ok(Some(CommitReport {
            batch_id: staged.batch_id,
            pieces_written: stats.pieces_written,
            projects_written: stats.projects_written,
            client_count: staged.preview.len(),
            message,
        }))
    }

    fn cancel(&self) -> bool {
        let _run = match RunGuard::try_acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!("cancelamento ignorado: operação de importação em andamento");
                return false;
            }
        };
        match self.staged.lock() {
            Ok(mut guard) => {
                let had_staged = guard.take().is_some();
                if had_staged {
                    info!("lote preparado descartado sem gravação");
                }
                had_staged
            }
            Err(_) => false,
        }
    }

    fn staged(&self) -> Option<AnalyzeReport> {
        match self.staged.lock() {
            Ok(guard) => guard.as_ref().map(Self::build_report),
            Err(_) => None,
        }
    }

    fn update_staged_record(
        &self,
        index: usize,
        edit: RecordEdit,
    ) -> ImportResult<Option<StagedRecord>> {
        let _run = match RunGuard::try_acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!(index, "edição ignorada: operação de importação em andamento");
                return Ok(None);
            }
        };
        let mut guard = self.lock_staged()?;
        let staged = match guard.as_mut() {
            Some(staged) => staged,
            None => return Ok(None),
        };
        let position = match staged.records.iter().position(|r| r.index == index) {
            Some(position) => position,
            None => {
                debug!(index, "edição para índice inexistente no lote");
                return Ok(None);
            }
        };

        // Revalidação do zero: aplica a edição no bruto e refaz a linha
        let mut raw = staged.records[position].raw.clone();
        edit.apply_to(&mut raw);
        let validation = self.validator.validate(&raw, staged.source);
        let mut updated = StagedRecord {
            index,
            raw,
            record: validation.record,
            issues: validation.issues,
            valid: false,
        };
        updated.recompute_valid();
        staged.records[position] = updated;

        if staged.source == ImportSource::PromobPdf {
            // Corrigir um código pode liberar OUTRA linha que estava
            // marcada como duplicata dele; refaz a marcação no lote todo
            for record in staged.records.iter_mut() {
                record
                    .issues
                    .retain(|i| i.kind != IssueKind::DuplicateBarcode);
            }
            self.mark_duplicates(&mut staged.records, &staged.known_barcodes);
            for record in staged.records.iter_mut() {
                record.recompute_valid();
            }
        }

        // A prévia acompanha o conjunto de linhas válidas
        staged.preview = self.aggregator.aggregate(&staged.records);

        debug!(
            index,
            valid = staged.records[position].valid,
            "linha do lote revalidada"
        );
        Ok(Some(staged.records[position].clone()))
    }
}
