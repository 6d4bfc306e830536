use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// URL base del worker, ej: "http://worker-1:9000". Es el handle que usa el scheduler.
pub type WorkerId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRegisterRequest {
    pub address: WorkerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRegisterResponse {
    pub ok: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkerInfo {
    pub address: WorkerId,
    pub registered_at: DateTime<Utc>,
    /// Cuántas veces se registró (un worker reiniciado vuelve a registrarse)
    pub registrations: u32,
}
