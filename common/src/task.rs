use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Map,
    Reduce,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::Map => f.write_str("map"),
            JobPhase::Reduce => f.write_str("reduce"),
        }
    }
}

/// Descriptor que el master envía al worker en cada intento de DoTask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoTaskArgs {
    pub job_name: JobId,
    pub phase: JobPhase,
    pub task_number: usize,

    /// Archivo de entrada; sólo en la fase map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Map: cantidad de reduce (buckets). Reduce: cantidad de map (archivos a leer).
    pub num_other_phase: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoTaskResponse {
    pub ok: bool,
}
