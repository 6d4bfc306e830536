use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_WORK_DIR: &str = "/data/mr";

#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// MASTER_BIND
    pub bind: String,
    /// MR_WORK_DIR: directorio compartido con los workers
    pub work_dir: PathBuf,
    /// RPC_TIMEOUT_SECS: timeout del transporte HTTP. Sin setear = sin timeout.
    pub rpc_timeout: Option<Duration>,
}

impl MasterConfig {
    /// Lee la configuración de variables de entorno.
    /// Valores que no parsean se ignoran y queda el default.
    pub fn from_env() -> Self {
        let bind = env::var("MASTER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

        let work_dir = env::var("MR_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORK_DIR));

        let rpc_timeout = env::var("RPC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            bind,
            work_dir,
            rpc_timeout,
        }
    }
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            rpc_timeout: None,
        }
    }
}
