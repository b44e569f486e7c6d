// ==========================================
// Teste de integração - pipeline de importação CSV
// ==========================================
// Objetivo: percorrer o fluxo análise -> conferência -> confirmação
// sobre o banco real, pela mesma montagem usada pela aplicação
// Cobertura: ImportApi + ManifestImporter + SqliteImportRepository
// ==========================================


use marcenaria_track::api::ApiError;
use marcenaria_track::app::AppState;
use marcenaria_track::domain::RecordEdit;
use marcenaria_track::logging;
use marcenaria_track::{ImportSource, IssueKind, PieceStatus, ScanOutcome};

// ==========================================
// Caso 1: manifesto válido do início ao fim
// ==========================================

#[tokio::test]
async fn test_fluxo_completo_csv() {
    logging::init_test();
    println!("\n=== E2E: manifesto CSV do início ao fim ===");

    // Etapa 1: banco e aplicação
    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");
    println!("✓ Etapa 1: aplicação montada (workspace {})", app.workspace_id);

    // Etapa 2: análise do manifesto de exemplo
    let report = app
        .import_api
        .analyze_manifest("tests/fixtures/manifesto_basico.csv")
        .await
        .expect("análise")
        .expect("nenhuma importação concorrente");
    println!("✓ Etapa 2: {}", report.message);

    assert_eq!(report.source, ImportSource::HaixunCsv);
    assert_eq!(report.total_rows, 6);
    assert_eq!(report.valid_count, 6);
    assert_eq!(report.error_count, 0);
    assert_eq!(report.skipped_rows, 0);
    assert!(report.issues.is_empty(), "manifesto limpo não gera ocorrências");

    // Prévia agrupada por cliente; o código do cliente é a chave
    assert_eq!(report.preview.len(), 2);
    let acme = report
        .preview
        .iter()
        .find(|g| g.client_code == "C001")
        .expect("grupo da Acme");
    assert_eq!(acme.client_name, "Acme Moveis");
    assert_eq!(acme.piece_count, 4);
    assert_eq!(acme.projects.len(), 2);
    let beta = report
        .preview
        .iter()
        .find(|g| g.client_code == "C002")
        .expect("grupo da Beta");
    assert_eq!(beta.piece_count, 2);
    println!("✓ Etapa 3: prévia com 2 clientes e 3 projetos");

    // Etapa 4: confirmação grava tudo e consome o lote
    let commit = app
        .import_api
        .confirm_import("maria")
        .await
        .expect("confirmação")
        .expect("lote preparado");
    println!("✓ Etapa 4: {}", commit.message);
    assert_eq!(commit.pieces_written, 6);
    assert_eq!(commit.projects_written, 3);
    assert_eq!(commit.client_count, 2);
    assert!(app.import_api.staged_report().is_none());

    // Etapa 5: peças consultáveis, todas pendentes
    let pieces = app
        .piece_api
        .list_pieces(None, None, None)
        .expect("listagem de peças");
    assert_eq!(pieces.len(), 6);
    assert!(pieces.iter().all(|p| p.status == PieceStatus::Pending));

    let summary = app.piece_api.status_summary(None).expect("resumo");
    assert_eq!(summary.total, 6);
    assert_eq!(summary.pending, 6);
    assert_eq!(summary.produced, 0);

    // A vírgula decimal da prateleira virou ponto na normalização
    let shelf = pieces
        .iter()
        .find(|p| p.barcode == "MT0004")
        .expect("prateleira importada");
    assert_eq!(shelf.dimensions, "900 x 250 x 18.5");
    assert_eq!(shelf.material, "MDF");

    let projects = app.piece_api.list_projects().expect("projetos");
    assert_eq!(projects.len(), 3);
    println!("✓ Etapa 5: {} peças e {} projetos no cadastro", pieces.len(), projects.len());

    // Etapa 6: trilha de auditoria do lote
    let batches = app.import_api.list_batches(10).await.expect("histórico");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, commit.batch_id);
    assert_eq!(batches[0].valid_rows, 6);
    assert_eq!(batches[0].committed_by.as_deref(), Some("maria"));
    assert_eq!(batches[0].file_name.as_deref(), Some("manifesto_basico.csv"));
    assert!(batches[0].committed_at.is_some());
    println!("✓ Etapa 6: lote registrado no histórico");
}

// ==========================================
// Caso 2: linha curta não trava o lote
// ==========================================

#[tokio::test]
async fn test_linha_curta_descartada_com_aviso() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    let row_a = test_helpers::manifest_row("MT0101", "Porta Superior", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("MT0102", "Porta Inferior", "Cozinha-A", "Acme Moveis");
    let short = "0,Porta Quebrada,500";
    let manifest =
        test_helpers::write_csv_manifest(&[&row_a, short, &row_b]).expect("manifesto");

    let report = app
        .import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");

    // A linha curta conta no total, sai das linhas e vira um Warning
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.valid_count, 2);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.warning_count, 1);
    assert_eq!(report.records.len(), 2);

    let issue = &report.issues[0];
    assert_eq!(issue.kind, IssueKind::MissingRequiredColumn);
    assert_eq!(issue.locator.to_string(), "linha 2");
    println!("✓ Ocorrência registrada: {}", issue.message);

    let commit = app
        .import_api
        .confirm_import("joão")
        .await
        .expect("confirmação")
        .expect("lote preparado");
    assert_eq!(commit.pieces_written, 2);

    let batches = app.import_api.list_batches(10).await.expect("histórico");
    assert_eq!(batches[0].total_rows, 3);
    assert_eq!(batches[0].skipped_rows, 1);
    assert_eq!(batches[0].warning_count, 1);
    println!("✓ Lote gravado com a contagem de descarte");
}

// ==========================================
// Caso 3: lote sem linha válida é rejeitado com as ocorrências
// ==========================================

#[tokio::test]
async fn test_lote_sem_linha_valida_rejeitado() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    // Códigos com menos de 3 caracteres: toda linha vira Error
    let row_a = test_helpers::manifest_row("x", "Porta", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("y", "Lateral", "Cozinha-A", "Acme Moveis");
    let manifest = test_helpers::write_csv_manifest(&[&row_a, &row_b]).expect("manifesto");

    let err = app
        .import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect_err("lote deveria ser rejeitado");

    match err {
        ApiError::ImportRejected { reason, issues } => {
            // A rejeição leva junto as ocorrências, para a tela mostrar
            assert!(reason.contains("nenhuma linha válida"));
            assert_eq!(issues.len(), 2);
            assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidBarcode));
            println!("✓ Rejeição com detalhe: {}", reason);
        }
        other => panic!("erro inesperado: {:?}", other),
    }

    // Nada ficou preparado nem gravado
    assert!(app.import_api.staged_report().is_none());
    let pieces = app.piece_api.list_pieces(None, None, None).expect("listagem");
    assert!(pieces.is_empty());
}

// ==========================================
// Caso 4: arquivos malformados são rejeitados inteiros
// ==========================================

#[tokio::test]
async fn test_manifesto_malformado_rejeitado() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    // Linha de cabeçalho na coluna do código
    let header = "num,peca,comp,larg,esp,material,cor,modulo,ambiente,a,b,Codigo,c,cliente,d,e,f";
    let row = test_helpers::manifest_row("MT0001", "Porta", "Cozinha-A", "Acme");
    let with_header = test_helpers::write_csv_manifest(&[header, &row, &row]).expect("manifesto");
    let err = app
        .import_api
        .analyze_manifest(with_header.path().to_str().unwrap())
        .await
        .expect_err("cabeçalho deveria rejeitar");
    assert!(matches!(err, ApiError::ImportError(_)));
    println!("✓ Cabeçalho rejeitado: {}", err);

    // Uma linha só não é um manifesto plausível
    let single = test_helpers::write_csv_manifest(&[&row]).expect("manifesto");
    let err = app
        .import_api
        .analyze_manifest(single.path().to_str().unwrap())
        .await
        .expect_err("arquivo de uma linha deveria rejeitar");
    assert!(matches!(err, ApiError::ImportError(_)));

    // Extensão desconhecida nem chega ao extrator
    let err = app
        .import_api
        .analyze_manifest("/tmp/manifesto.xlsx")
        .await
        .expect_err("extensão estranha deveria rejeitar");
    assert!(matches!(err, ApiError::ImportError(_)));

    // Caminho vazio cai na validação de entrada
    let err = app
        .import_api
        .analyze_manifest("   ")
        .await
        .expect_err("caminho vazio deveria rejeitar");
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// Caso 5: reimportação sobrescreve sem duplicar
// ==========================================

#[tokio::test]
async fn test_reimportacao_sobrescreve_e_volta_para_pendente() {
    logging::init_test();
    println!("\n=== E2E: reimportação do mesmo manifesto ===");

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    // Primeira importação
    let row_a = test_helpers::manifest_row("MT0201", "Porta Direita", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("MT0202", "Porta Esquerda", "Cozinha-A", "Acme Moveis");
    let manifest = test_helpers::write_csv_manifest(&[&row_a, &row_b]).expect("manifesto");
    app.import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");
    app.import_api
        .confirm_import("maria")
        .await
        .expect("confirmação")
        .expect("lote preparado");
    println!("✓ Primeira importação: 2 peças");

    // A peça é produzida entre as duas importações
    let scan = app.scan_api.scan_barcode("MT0201", "carlos").expect("bipagem");
    assert!(matches!(scan.outcome, ScanOutcome::Produced(_)));
    let summary = app.piece_api.status_summary(None).expect("resumo");
    assert_eq!(summary.produced, 1);
    println!("✓ Peça MT0201 produzida no chão de fábrica");

    // Manifesto corrigido chega com o mesmo código
    let row_a2 =
        test_helpers::manifest_row("MT0201", "Porta Direita Rev2", "Cozinha-A", "Acme Moveis");
    let manifest2 = test_helpers::write_csv_manifest(&[&row_a2, &row_b]).expect("manifesto");
    app.import_api
        .analyze_manifest(manifest2.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");
    app.import_api
        .confirm_import("maria")
        .await
        .expect("confirmação")
        .expect("lote preparado");

    // Sem duplicar: o cadastro foi sobrescrito e a produção zerada
    let pieces = app.piece_api.list_pieces(None, None, None).expect("listagem");
    assert_eq!(pieces.len(), 2);
    let updated = pieces
        .iter()
        .find(|p| p.barcode == "MT0201")
        .expect("peça reimportada");
    assert_eq!(updated.piece_name, "Porta Direita Rev2");
    assert_eq!(updated.status, PieceStatus::Pending);
    assert_eq!(updated.produced_by, None);
    println!("✓ Reimportação sobrescreveu e devolveu a peça para PENDENTE");

    // As duas importações ficam no histórico
    let batches = app.import_api.list_batches(10).await.expect("histórico");
    assert_eq!(batches.len(), 2);
}

// ==========================================
// Caso 6: cancelamento e substituição do lote preparado
// ==========================================

#[tokio::test]
async fn test_cancelamento_descarta_lote() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    let row_a = test_helpers::manifest_row("MT0301", "Porta", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("MT0302", "Lateral", "Cozinha-A", "Acme Moveis");
    let manifest = test_helpers::write_csv_manifest(&[&row_a, &row_b]).expect("manifesto");

    let first = app
        .import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");

    // Uma nova análise substitui o lote anterior
    let second = app
        .import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");
    assert_ne!(first.batch_id, second.batch_id);
    assert_eq!(
        app.import_api.staged_report().expect("fotografia").batch_id,
        second.batch_id
    );

    // O cancelamento descarta sem gravar
    assert!(app.import_api.cancel_import());
    assert!(app.import_api.staged_report().is_none());
    assert!(!app.import_api.cancel_import(), "segundo cancelamento é vazio");

    let confirm = app.import_api.confirm_import("maria").await.expect("confirmação");
    assert!(confirm.is_none(), "sem lote preparado não há o que confirmar");

    let pieces = app.piece_api.list_pieces(None, None, None).expect("listagem");
    assert!(pieces.is_empty());
    println!("✓ Cancelamento não deixou rastro no cadastro");
}

// ==========================================
// Caso 7: conferência corrige linha inválida antes da confirmação
// ==========================================

#[tokio::test]
async fn test_conferencia_corrige_linha_invalida() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    // O primeiro código é curto demais; os outros dois passam
    let bad = test_helpers::manifest_row("xy", "Porta Torta", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("MT0402", "Porta", "Cozinha-A", "Acme Moveis");
    let row_c = test_helpers::manifest_row("MT0403", "Lateral", "Cozinha-A", "Acme Moveis");
    let manifest = test_helpers::write_csv_manifest(&[&bad, &row_b, &row_c]).expect("manifesto");

    let report = app
        .import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");
    assert_eq!(report.valid_count, 2);
    assert_eq!(report.error_count, 1);
    assert!(!report.records[0].valid);

    // O operador corrige o código na tela de conferência
    let edit = RecordEdit {
        barcode: Some("MT0401".to_string()),
        ..Default::default()
    };
    let updated = app
        .import_api
        .update_record(0, edit)
        .expect("edição")
        .expect("linha existente");
    assert!(updated.valid);
    assert_eq!(updated.record.barcode, "MT0401");

    let snapshot = app.import_api.staged_report().expect("fotografia");
    assert_eq!(snapshot.valid_count, 3);
    assert_eq!(snapshot.error_count, 0);
    println!("✓ Correção revalidou a linha: {} válidas", snapshot.valid_count);

    // Edição fora do lote não derruba nada
    let missing = app
        .import_api
        .update_record(99, RecordEdit::default())
        .expect("edição");
    assert!(missing.is_none());

    let commit = app
        .import_api
        .confirm_import("maria")
        .await
        .expect("confirmação")
        .expect("lote preparado");
    assert_eq!(commit.pieces_written, 3);
    println!("✓ {}", commit.message);
}

// ==========================================
// Caso 8: operador é obrigatório na confirmação
// ==========================================

#[tokio::test]
async fn test_operador_obrigatorio_na_confirmacao() {
    logging::init_test();

    let (_db_file, db_path) = test_helpers::create_test_db().expect("banco de teste");
    let app = AppState::new(&db_path).await.expect("estado da aplicação");

    let row_a = test_helpers::manifest_row("MT0501", "Porta", "Cozinha-A", "Acme Moveis");
    let row_b = test_helpers::manifest_row("MT0502", "Lateral", "Cozinha-A", "Acme Moveis");
    let manifest = test_helpers::write_csv_manifest(&[&row_a, &row_b]).expect("manifesto");
    app.import_api
        .analyze_manifest(manifest.path().to_str().unwrap())
        .await
        .expect("análise")
        .expect("lote preparado");

    let err = app
        .import_api
        .confirm_import("   ")
        .await
        .expect_err("operador em branco deveria rejeitar");
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // O lote sobrevive à recusa e confirma com o nome preenchido
    assert!(app.import_api.staged_report().is_some());
    let commit = app
        .import_api
        .confirm_import("  maria  ")
        .await
        .expect("confirmação")
        .expect("lote preparado");
    assert_eq!(commit.pieces_written, 2);

    let batches = app.import_api.list_batches(10).await.expect("histórico");
    assert_eq!(batches[0].committed_by.as_deref(), Some("maria"));
    println!("✓ Operador registrado sem os espaços: {:?}", batches[0].committed_by);
}
