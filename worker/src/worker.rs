use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use common::{
    engine,
    naming::merge_name,
    reduce::{do_reduce, KeyOrder, ReduceTask},
    wordcount, DoTaskArgs, DoTaskResponse, JobPhase, WorkerRegisterRequest,
};
use reqwest::Client;
use std::{
    env, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{info, warn};

const DEFAULT_BIND: &str = "0.0.0.0:9000";
const DEFAULT_WORK_DIR: &str = "/data/mr";
const REGISTER_RETRY_SECS: u64 = 2;

/// Configuración del worker, desde variables de entorno.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub master_url: String,
    pub bind: String,
    /// URL con la que el master nos llama; default http://<hostname>:<puerto>
    pub advertise_url: String,
    pub work_dir: PathBuf,
    pub key_order: KeyOrder,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let master_url =
            env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let bind = env::var("WORKER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

        let advertise_url = env::var("WORKER_ADVERTISE_URL").unwrap_or_else(|_| {
            let host = hostname::get()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let port = bind.rsplit(':').next().unwrap_or("9000");
            format!("http://{}:{}", host, port)
        });

        let work_dir = env::var("MR_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORK_DIR));

        let key_order = env::var("REDUCE_KEY_ORDER")
            .ok()
            .and_then(|s| s.parse::<KeyOrder>().ok())
            .unwrap_or_default();

        Self {
            master_url,
            bind,
            advertise_url,
            work_dir,
            key_order,
        }
    }
}

#[derive(Clone)]
struct WorkerState {
    work_dir: Arc<PathBuf>,
    key_order: KeyOrder,
}

pub fn build_router(work_dir: PathBuf, key_order: KeyOrder) -> Router {
    let state = WorkerState {
        work_dir: Arc::new(work_dir),
        key_order,
    };
    Router::new()
        .route("/api/v1/tasks/do", post(do_task))
        .with_state(state)
}

/// Ejecuta una tarea map o reduce con la aplicación WordCount.
pub fn execute_task(work_dir: &Path, key_order: KeyOrder, args: &DoTaskArgs) -> io::Result<()> {
    match args.phase {
        JobPhase::Map => {
            let file = args.file.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "tarea map sin archivo de entrada")
            })?;
            engine::do_map(
                work_dir,
                &args.job_name,
                args.task_number,
                Path::new(file),
                args.num_other_phase,
                wordcount::map_f,
            )
        }
        JobPhase::Reduce => {
            let out_file = work_dir.join(merge_name(&args.job_name, args.task_number));
            let task = ReduceTask {
                work_dir,
                job_name: &args.job_name,
                reduce_task: args.task_number,
                n_map: args.num_other_phase,
                out_file: &out_file,
                order: key_order,
            };
            do_reduce(&task, wordcount::reduce_f).map(|_| ())
        }
    }
}

// DoTask: corre la tarea en un hilo de bloqueo y responde ok / error
async fn do_task(
    State(state): State<WorkerState>,
    Json(args): Json<DoTaskArgs>,
) -> (StatusCode, Json<DoTaskResponse>) {
    info!(
        "tengo tarea {} {} del job {}",
        args.phase, args.task_number, args.job_name
    );

    let work_dir = Arc::clone(&state.work_dir);
    let key_order = state.key_order;
    let task_args = args.clone();
    let handle =
        tokio::task::spawn_blocking(move || execute_task(&work_dir, key_order, &task_args));

    let ok = match handle.await {
        Ok(Ok(())) => {
            info!("terminé tarea {} {} correctamente", args.phase, args.task_number);
            true
        }
        Ok(Err(e)) => {
            warn!("error procesando tarea {} {}: {:?}", args.phase, args.task_number, e);
            false
        }
        Err(e) => {
            warn!("panic o join error en tarea {} {}: {:?}", args.phase, args.task_number, e);
            false
        }
    };

    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(DoTaskResponse { ok }))
}

/// Se registra en el master, reintentando hasta que responda.
async fn register_with_master(client: &Client, master_url: &str, advertise_url: &str) {
    let register_url = format!("{}/api/v1/workers/register", master_url);

    loop {
        let res = client
            .post(&register_url)
            .json(&WorkerRegisterRequest {
                address: advertise_url.to_string(),
            })
            .send()
            .await;

        match res {
            Ok(resp) if resp.status().is_success() => {
                info!("worker {} registrado en {}", advertise_url, master_url);
                return;
            }
            Ok(resp) => warn!("el master rechazó el registro: status {}", resp.status()),
            Err(e) => warn!("master no disponible ({}), reintento en {}s", e, REGISTER_RETRY_SECS),
        }
        sleep(Duration::from_secs(REGISTER_RETRY_SECS)).await;
    }
}

/// Loop principal del worker.
/// - Levanta el endpoint DoTask.
/// - Se registra en el master.
/// - Atiende tareas hasta que lo maten.
pub async fn run(config: WorkerConfig) -> Result<()> {
    std::fs::create_dir_all(&config.work_dir).with_context(|| {
        format!("no se pudo crear el directorio de trabajo {}", config.work_dir.display())
    })?;

    let app = build_router(config.work_dir.clone(), config.key_order);
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind))?;

    info!(
        "worker escuchando en {} (anunciado como {}, work_dir={})",
        listener.local_addr()?,
        config.advertise_url,
        config.work_dir.display()
    );

    // el registro va después del bind: el master puede despachar enseguida
    let client = Client::new();
    let master_url = config.master_url.clone();
    let advertise_url = config.advertise_url.clone();
    tokio::spawn(async move {
        register_with_master(&client, &master_url, &advertise_url).await;
    });

    axum::serve(listener, app).await?;
    Ok(())
}
