// Utilitário de linha de comando: importa um manifesto de ponta a ponta.
//
// Uso:
//   cargo run --bin import_manifest -- <arquivo.csv|arquivo.pdf> [operador]
//
// O banco é o mesmo da aplicação (MARCENARIA_TRACK_DB_PATH ou o
// caminho padrão). Analisa, imprime o relatório e confirma o lote;
// com --dry-run só analisa e descarta.

use marcenaria_track::app::{get_default_db_path, AppState};
use marcenaria_track::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut file_path: Option<String> = None;
    let mut operator = "cli".to_string();
    let mut dry_run = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            other if file_path.is_none() => file_path = Some(other.to_string()),
            other => operator = other.to_string(),
        }
    }

    let file_path = match file_path {
        Some(path) => path,
        None => {
            eprintln!("uso: import_manifest [--dry-run] <arquivo.csv|arquivo.pdf> [operador]");
            std::process::exit(2);
        }
    };

    let db_path = get_default_db_path();
    let state = AppState::new(&db_path).await?;

    let report = state
        .import_api
        .analyze_manifest(&file_path)
        .await?
        .ok_or_else(|| anyhow::anyhow!("outra importação em andamento"))?;

    println!("{}", report.message);
    println!(
        "arquivo: {} ({} linhas, {} descartadas na extração)",
        report.file_name, report.total_rows, report.skipped_rows
    );
    println!(
        "linhas: {} válidas, {} erros, {} avisos",
        report.valid_count, report.error_count, report.warning_count
    );

    for issue in &report.issues {
        println!("  [{}] {} - {}", issue.severity, issue.locator, issue.message);
    }

    println!("prévia por cliente:");
    for group in &report.preview {
        println!("  {} ({} peças)", group.client_name, group.piece_count);
        for project in &group.projects {
            println!(
                "    {} - {} peças, {} módulo(s)",
                project.project_name,
                project.piece_count,
                project.modules.len()
            );
        }
    }

    if dry_run {
        state.import_api.cancel_import();
        println!("análise concluída (nada foi gravado)");
        return Ok(());
    }

    let commit = state
        .import_api
        .confirm_import(&operator)
        .await?
        .ok_or_else(|| anyhow::anyhow!("nenhum lote preparado para confirmar"))?;

    println!("{}", commit.message);
    println!(
        "gravadas {} peças em {} projeto(s) de {} cliente(s) [lote {}]",
        commit.pieces_written, commit.projects_written, commit.client_count, commit.batch_id
    );
    Ok(())
}
