// ==========================================
// Marcenaria Track - Entrada principal
// ==========================================
// Abre o banco, garante o bootstrap do workspace e imprime o
// resumo do chão de fábrica
// ==========================================

use marcenaria_track::app::{get_default_db_path, AppState};
use marcenaria_track::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!(
        "{} v{}",
        marcenaria_track::APP_NAME,
        marcenaria_track::VERSION
    );
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "usando banco de dados");

    let state = AppState::new(&db_path).await?;

    // Resumo geral do workspace
    let summary = state.piece_api.status_summary(None)?;
    tracing::info!(
        workspace_id = %state.workspace_id,
        total = summary.total,
        pending = summary.pending,
        produced = summary.produced,
        "resumo de produção"
    );

    let open_volumes = state.volume_api.list_volumes(Some("OPEN"))?;
    tracing::info!(open_volumes = open_volumes.len(), "volumes em montagem");

    let batches = state.import_api.list_batches(5).await?;
    for batch in &batches {
        tracing::info!(
            batch_id = %batch.batch_id,
            file = batch.file_name.as_deref().unwrap_or("-"),
            pieces = batch.valid_rows,
            "lote importado"
        );
    }

    Ok(())
}
