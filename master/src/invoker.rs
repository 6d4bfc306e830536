use common::{DoTaskArgs, DoTaskResponse};
use reqwest::Client;
use std::{future::Future, time::Duration};
use tracing::debug;

/// Primitiva de invocación remota: ejecuta DoTask en un worker.
/// Devuelve true sólo si el worker confirma que la tarea terminó bien;
/// cualquier error (red, worker, timeout del transporte) es false.
pub trait TaskInvoker: Send + Sync + 'static {
    fn invoke(&self, worker: &str, args: &DoTaskArgs) -> impl Future<Output = bool> + Send;
}

/// Invocador HTTP: POST {worker}/api/v1/tasks/do con el descriptor en JSON.
#[derive(Clone)]
pub struct HttpInvoker {
    client: Client,
}

impl HttpInvoker {
    pub fn new(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl TaskInvoker for HttpInvoker {
    fn invoke(&self, worker: &str, args: &DoTaskArgs) -> impl Future<Output = bool> + Send {
        let url = format!("{}/api/v1/tasks/do", worker.trim_end_matches('/'));
        let request = self.client.post(url).json(args);

        async move {
            let resp = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!("DoTask sin respuesta: {:?}", e);
                    return false;
                }
            };

            if !resp.status().is_success() {
                debug!("DoTask devolvió status {}", resp.status());
                return false;
            }

            match resp.json::<DoTaskResponse>().await {
                Ok(body) => body.ok,
                Err(e) => {
                    debug!("respuesta de DoTask ilegible: {:?}", e);
                    false
                }
            }
        }
    }
}
