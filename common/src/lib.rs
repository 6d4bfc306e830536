pub mod engine;
pub mod job;
pub mod naming;
pub mod record;
pub mod reduce;
pub mod task;
pub mod wordcount;
pub mod worker;

pub use job::{JobId, JobInfo, JobRequest, JobStatus};
pub use record::KeyValue;
pub use reduce::{KeyOrder, ReduceTask};
pub use task::{DoTaskArgs, DoTaskResponse, JobPhase};
pub use worker::{WorkerId, WorkerInfo, WorkerRegisterRequest, WorkerRegisterResponse};
