use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use common::{
    JobInfo, JobRequest, JobStatus, WorkerInfo, WorkerRegisterRequest, WorkerRegisterResponse,
};
use glob::glob;
use tracing::{info, warn};

use crate::driver::run_job;
use crate::invoker::TaskInvoker;
use crate::state::AppState;

pub fn build_router<I: TaskInvoker>(state: AppState<I>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jobs", post(create_job::<I>))
        .route("/api/v1/jobs/:id", get(get_job::<I>))
        .route("/api/v1/workers", get(list_workers::<I>))
        .route("/api/v1/workers/register", post(register_worker::<I>))
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

/// Expande cada entrada como patrón glob y se queda con los archivos regulares.
/// Un patrón inválido es un error del cliente.
fn expand_inputs(inputs: &[String]) -> Result<Vec<String>, StatusCode> {
    let mut files = Vec::new();

    for pattern in inputs {
        let paths = glob(pattern).map_err(|e| {
            warn!("patrón de entrada inválido {}: {}", pattern, e);
            StatusCode::BAD_REQUEST
        })?;

        for path in paths.flatten() {
            if path.is_file() {
                files.push(path.to_string_lossy().to_string());
            }
        }
    }

    Ok(files)
}

// Crea un job nuevo: una tarea map por archivo de entrada y n_reduce tareas reduce
async fn create_job<I: TaskInvoker>(
    State(state): State<AppState<I>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<JobInfo>, StatusCode> {
    let files = expand_inputs(&req.inputs)?;
    let n_reduce = req.n_reduce.max(1);

    let job_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    // sin archivos no hay nada que correr
    let (status, finished_at) = if files.is_empty() {
        (JobStatus::Succeeded, Some(now))
    } else {
        (JobStatus::Accepted, None)
    };

    let job_info = JobInfo {
        id: job_id.clone(),
        name: req.name,
        status,
        files: files.clone(),
        n_reduce,
        output_path: None,
        error: None,
        submitted_at: now,
        started_at: None,
        finished_at,
    };

    {
        let mut jobs = state.jobs.lock().unwrap();
        jobs.insert(job_id.clone(), job_info.clone());
    }

    info!(
        "job {} ({}) aceptado: {} tareas map, {} reduce",
        job_id,
        job_info.name,
        files.len(),
        n_reduce
    );

    if !files.is_empty() {
        tokio::spawn(drive_job(state, job_id, files, n_reduce));
    }

    Ok(Json(job_info))
}

/// Corre el job en segundo plano y va actualizando su JobInfo.
async fn drive_job<I: TaskInvoker>(
    state: AppState<I>,
    job_id: String,
    files: Vec<String>,
    n_reduce: usize,
) {
    {
        let mut jobs = state.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        }
    }

    let ctx = state.driver_context();
    let result = run_job(&ctx, &job_id, &files, n_reduce).await;

    let mut jobs = state.jobs.lock().unwrap();
    if let Some(job) = jobs.get_mut(&job_id) {
        match result {
            Ok(path) => {
                job.status = JobStatus::Succeeded;
                job.output_path = Some(path.to_string_lossy().to_string());
            }
            Err(e) => {
                warn!("job {} falló en el merge final: {:?}", job_id, e);
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
            }
        }
        job.finished_at = Some(Utc::now());
    }
}

// Devuelve info de un job
async fn get_job<I: TaskInvoker>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>, StatusCode> {
    let jobs = state.jobs.lock().unwrap();

    if let Some(job) = jobs.get(&id) {
        Ok(Json(job.clone()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

// Registra un worker y lo deja disponible para el scheduler
async fn register_worker<I: TaskInvoker>(
    State(state): State<AppState<I>>,
    Json(req): Json<WorkerRegisterRequest>,
) -> Result<Json<WorkerRegisterResponse>, StatusCode> {
    let address = req.address.trim().trim_end_matches('/').to_string();
    if address.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    {
        let mut workers = state.workers.lock().unwrap();
        let entry = workers.entry(address.clone()).or_insert_with(|| WorkerInfo {
            address: address.clone(),
            registered_at: Utc::now(),
            registrations: 0,
        });
        entry.registered_at = Utc::now();
        entry.registrations += 1;
    }

    if state.feed.register(address.clone()) {
        info!(
            "worker registrado: {} ({} disponibles)",
            address,
            state.feed.available()
        );
    } else {
        info!("worker {} ya estaba encolado o en vuelo, no se duplica", address);
    }
    Ok(Json(WorkerRegisterResponse { ok: true }))
}

async fn list_workers<I: TaskInvoker>(State(state): State<AppState<I>>) -> Json<Vec<WorkerInfo>> {
    let workers = state.workers.lock().unwrap();

    let mut out: Vec<WorkerInfo> = workers.values().cloned().collect();
    out.sort_by(|a, b| a.address.cmp(&b.address));

    Json(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use common::DoTaskArgs;
    use std::{future::Future, path::PathBuf};
    use tower::ServiceExt;

    struct AlwaysOk;

    impl TaskInvoker for AlwaysOk {
        fn invoke(&self, _worker: &str, _args: &DoTaskArgs) -> impl Future<Output = bool> + Send {
            async { true }
        }
    }

    fn test_state() -> AppState<AlwaysOk> {
        AppState::new(AlwaysOk, PathBuf::from("/tmp/handlers_tests"))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn register_agrega_el_worker_al_feed() {
        let state = test_state();
        let app = build_router(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/v1/workers/register",
                serde_json::json!({ "address": "http://w1:9000/" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(state.feed.available(), 1);
        assert_eq!(state.feed.acquire().await, "http://w1:9000");

        let workers = state.workers.lock().unwrap();
        assert_eq!(workers["http://w1:9000"].registrations, 1);
    }

    #[tokio::test]
    async fn register_repetido_no_duplica_el_worker_en_el_feed() {
        let state = test_state();

        for _ in 0..2 {
            let resp = build_router(state.clone())
                .oneshot(post_json(
                    "/api/v1/workers/register",
                    serde_json::json!({ "address": "http://w1:9000" }),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(state.feed.available(), 1);
        assert_eq!(state.workers.lock().unwrap()["http://w1:9000"].registrations, 2);
    }

    #[tokio::test]
    async fn register_rechaza_direccion_vacia() {
        let app = build_router(test_state());

        let resp = app
            .oneshot(post_json(
                "/api/v1/workers/register",
                serde_json::json!({ "address": "  " }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn job_sin_archivos_termina_enseguida() {
        let state = test_state();
        let app = build_router(state.clone());

        let resp = app
            .oneshot(post_json(
                "/api/v1/jobs",
                serde_json::json!({
                    "name": "vacio",
                    "inputs": ["/no/existe/*.txt"],
                    "n_reduce": 0,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let job = body_json(resp).await;
        assert_eq!(job["status"], "SUCCEEDED");
        assert_eq!(job["n_reduce"], 1);

        let id = job["id"].as_str().unwrap().to_string();
        assert!(state.jobs.lock().unwrap().contains_key(&id));
    }

    #[tokio::test]
    async fn glob_invalido_da_bad_request() {
        let app = build_router(test_state());

        let resp = app
            .oneshot(post_json(
                "/api/v1/jobs",
                serde_json::json!({ "name": "x", "inputs": ["[a-"], "n_reduce": 2 }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn job_inexistente_da_not_found() {
        let app = build_router(test_state());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/jobs/no-existe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
