use common::{engine, JobPhase};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

use crate::feed::WorkerFeed;
use crate::invoker::TaskInvoker;
use crate::scheduler::schedule;

/// Lo que necesita el driver para correr un job.
pub struct DriverContext<I: TaskInvoker> {
    pub feed: WorkerFeed,
    pub invoker: Arc<I>,
    /// Directorio compartido con los workers
    pub work_dir: PathBuf,
}

impl<I: TaskInvoker> Clone for DriverContext<I> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            invoker: Arc::clone(&self.invoker),
            work_dir: self.work_dir.clone(),
        }
    }
}

/// Corre un job completo:
/// 1. fase map (una tarea por archivo)
/// 2. fase reduce (`n_reduce` tareas)
/// 3. merge de las salidas de reduce en un solo archivo
/// 4. limpieza de intermedios
///
/// Las fases no fallan (reintentan hasta terminar); los errores sólo pueden
/// venir del merge final.
pub async fn run_job<I: TaskInvoker>(
    ctx: &DriverContext<I>,
    job_name: &str,
    files: &[String],
    n_reduce: usize,
) -> io::Result<PathBuf> {
    info!(
        "job {}: {} archivos de entrada, {} reduce",
        job_name,
        files.len(),
        n_reduce
    );

    schedule(
        job_name,
        files,
        n_reduce,
        JobPhase::Map,
        &ctx.feed,
        Arc::clone(&ctx.invoker),
    )
    .await;

    schedule(
        job_name,
        files,
        n_reduce,
        JobPhase::Reduce,
        &ctx.feed,
        Arc::clone(&ctx.invoker),
    )
    .await;

    let output = finish_job(&ctx.work_dir, job_name, files.len(), n_reduce).await?;
    info!("job {} terminado: {}", job_name, output.display());
    Ok(output)
}

/// Merge + limpieza en un hilo de bloqueo.
async fn finish_job(
    work_dir: &Path,
    job_name: &str,
    n_map: usize,
    n_reduce: usize,
) -> io::Result<PathBuf> {
    let work_dir = work_dir.to_path_buf();
    let job_name = job_name.to_string();

    let handle = tokio::task::spawn_blocking(move || {
        let output = engine::merge_outputs(&work_dir, &job_name, n_reduce)?;

        if let Err(e) = engine::cleanup_intermediate(&work_dir, &job_name, n_map, n_reduce) {
            // la salida final ya quedó escrita
            warn!("no se pudieron borrar intermedios del job {}: {:?}", job_name, e);
        }
        Ok::<_, io::Error>(output)
    });

    match handle.await {
        Ok(res) => res,
        Err(e) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("merge del job abortado: {e}"),
        )),
    }
}
