use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub name: String,

    /// Archivos o patrones glob de entrada, ej: "/data/input/*.txt".
    /// Cada archivo que matchea es una tarea map.
    pub inputs: Vec<String>,

    /// Cantidad de tareas reduce
    pub n_reduce: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Accepted,
    Running,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: JobId,
    pub name: String,
    pub status: JobStatus,

    /// Archivos de entrada ya expandidos (uno por tarea map)
    pub files: Vec<String>,
    pub n_reduce: usize,

    /// Archivo final fusionado, cuando el job terminó bien
    pub output_path: Option<String>,
    pub error: Option<String>,

    /// -------- Métricas del job --------
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
