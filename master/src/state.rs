// master/src/state.rs

use common::{JobId, JobInfo, WorkerId, WorkerInfo};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::driver::DriverContext;
use crate::feed::WorkerFeed;
use crate::invoker::TaskInvoker;

pub struct AppState<I: TaskInvoker> {
    pub jobs: Arc<Mutex<HashMap<JobId, JobInfo>>>,
    // workers que se registraron alguna vez (sólo informativo)
    pub workers: Arc<Mutex<HashMap<WorkerId, WorkerInfo>>>,
    // workers disponibles para el scheduler
    pub feed: WorkerFeed,
    pub invoker: Arc<I>,
    pub work_dir: PathBuf,
}

impl<I: TaskInvoker> AppState<I> {
    pub fn new(invoker: I, work_dir: PathBuf) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            workers: Arc::new(Mutex::new(HashMap::new())),
            feed: WorkerFeed::new(),
            invoker: Arc::new(invoker),
            work_dir,
        }
    }

    pub fn driver_context(&self) -> DriverContext<I> {
        DriverContext {
            feed: self.feed.clone(),
            invoker: Arc::clone(&self.invoker),
            work_dir: self.work_dir.clone(),
        }
    }
}

impl<I: TaskInvoker> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            jobs: Arc::clone(&self.jobs),
            workers: Arc::clone(&self.workers),
            feed: self.feed.clone(),
            invoker: Arc::clone(&self.invoker),
            work_dir: self.work_dir.clone(),
        }
    }
}
