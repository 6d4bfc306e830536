use common::{DoTaskArgs, JobPhase, WorkerId};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::feed::WorkerFeed;
use crate::invoker::TaskInvoker;

/// Resultado de un intento de DoTask, reportado al loop coordinador.
enum Outcome {
    Succeeded { task: usize, worker: WorkerId },
    Failed { task: usize, worker: WorkerId },
}

/// Ejecuta todas las tareas de una fase y vuelve sólo cuando cada una
/// terminó bien al menos una vez.
///
/// - map: una tarea por archivo; `num_other_phase` = n_reduce
/// - reduce: `n_reduce` tareas; `num_other_phase` = cantidad de archivos
///
/// Cada tarea pendiente toma un worker del feed (espera si no hay) y se
/// despacha en su propia task de tokio. Si la invocación sale bien, la tarea
/// se marca hecha una sola vez y el worker vuelve al feed. Si falla, el
/// worker se descarta y la tarea vuelve a la cola, sin tope de reintentos.
///
/// Los fallos nunca llegan al llamador: si no hay workers que respondan,
/// la fase queda esperando.
pub async fn schedule<I: TaskInvoker>(
    job_name: &str,
    map_files: &[String],
    n_reduce: usize,
    phase: JobPhase,
    feed: &WorkerFeed,
    invoker: Arc<I>,
) {
    let (ntasks, n_other) = match phase {
        JobPhase::Map => (map_files.len(), n_reduce),
        JobPhase::Reduce => (n_reduce, map_files.len()),
    };

    info!(
        "schedule: {} tareas {} del job {} ({} I/Os)",
        ntasks, phase, job_name, n_other
    );

    // tareas que todavía no tienen un intento en vuelo
    let mut pending: VecDeque<usize> = (0..ntasks).collect();
    // una marca por tarea: se cuenta como hecha una sola vez
    let mut done = vec![false; ntasks];
    let mut remaining = ntasks;
    let mut failures: u64 = 0;

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<Outcome>();

    while remaining > 0 {
        let outcome = if let Some(&task) = pending.front() {
            tokio::select! {
                worker = feed.acquire() => {
                    pending.pop_front();

                    let args = DoTaskArgs {
                        job_name: job_name.to_string(),
                        phase,
                        task_number: task,
                        file: match phase {
                            JobPhase::Map => Some(map_files[task].clone()),
                            JobPhase::Reduce => None,
                        },
                        num_other_phase: n_other,
                    };

                    debug!("despachando tarea {} {} al worker {}", phase, task, worker);
                    dispatch(worker, args, Arc::clone(&invoker), outcome_tx.clone());
                    continue;
                }
                Some(outcome) = outcome_rx.recv() => outcome,
            }
        } else {
            // todo lo pendiente está en vuelo: sólo queda esperar resultados
            match outcome_rx.recv().await {
                Some(outcome) => outcome,
                None => break,
            }
        };

        match outcome {
            Outcome::Succeeded { task, worker } => {
                if !done[task] {
                    done[task] = true;
                    remaining -= 1;
                }
                feed.release(worker);
            }
            Outcome::Failed { task, worker } => {
                failures += 1;
                warn!(
                    "tarea {} {} del job {} falló en el worker {}; se descarta el worker y se reencola",
                    phase, task, job_name, worker
                );
                feed.discard(&worker);
                if !done[task] {
                    pending.push_back(task);
                }
            }
        }
    }

    info!(
        "schedule: fase {} del job {} terminada ({} fallos reintentados)",
        phase, job_name, failures
    );
}

/// Lanza un intento de DoTask en segundo plano y reporta el resultado.
fn dispatch<I: TaskInvoker>(
    worker: WorkerId,
    args: DoTaskArgs,
    invoker: Arc<I>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
) {
    tokio::spawn(async move {
        let task = args.task_number;
        let ok = invoker.invoke(&worker, &args).await;

        let outcome = if ok {
            Outcome::Succeeded { task, worker }
        } else {
            Outcome::Failed { task, worker }
        };
        // el coordinador siempre espera mientras quede algo en vuelo
        let _ = outcome_tx.send(outcome);
    });
}
