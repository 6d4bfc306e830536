use common::WorkerId;
use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Mutex};

/// Cola de workers disponibles.
/// - `register` / `release` no bloquean (push)
/// - `acquire` espera hasta que haya un worker (pop bloqueante)
/// - `discard` da de baja un worker que falló
///
/// Cada handle está a lo sumo una vez en el feed, encolado o en vuelo:
/// registrarlo de nuevo mientras tanto no hace nada.
///
/// Es compartida entre fases y jobs: un worker devuelto tras un éxito queda
/// disponible para la siguiente tarea, sea de la fase que sea.
#[derive(Clone)]
pub struct WorkerFeed {
    tx: mpsc::UnboundedSender<WorkerId>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<WorkerId>>>,
    queued: Arc<AtomicUsize>,
    // handles encolados o tomados por una tarea
    members: Arc<std::sync::Mutex<HashSet<WorkerId>>>,
}

impl WorkerFeed {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            queued: Arc::new(AtomicUsize::new(0)),
            members: Arc::new(std::sync::Mutex::new(HashSet::new())),
        }
    }

    /// Alta de un worker. Devuelve false si ya estaba encolado o en vuelo.
    pub fn register(&self, worker: WorkerId) -> bool {
        if !self.members.lock().unwrap().insert(worker.clone()) {
            return false;
        }
        self.push(worker);
        true
    }

    /// Baja de un worker tomado con `acquire` cuya tarea falló.
    /// Puede volver a registrarse después.
    pub fn discard(&self, worker: &str) {
        self.members.lock().unwrap().remove(worker);
    }

    /// Devuelve un worker que terminó bien su tarea.
    pub fn release(&self, worker: WorkerId) {
        self.push(worker);
    }

    fn push(&self, worker: WorkerId) {
        // el receptor vive mientras viva algún clon del feed
        if self.tx.send(worker).is_ok() {
            self.queued.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Toma el siguiente worker disponible, en orden de llegada.
    /// Cancel-safe: si el future se descarta no se pierde ningún worker.
    pub async fn acquire(&self) -> WorkerId {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(worker) => {
                self.queued.fetch_sub(1, Ordering::SeqCst);
                worker
            }
            // self.tx mantiene el canal abierto, no debería pasar nunca
            None => std::future::pending().await,
        }
    }

    /// Workers encolados en este momento.
    pub fn available(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

impl Default for WorkerFeed {
    fn default() -> Self {
        Self::new()
    }
}
