pub mod config;
pub mod driver;
pub mod feed;
pub mod handlers;
pub mod invoker;
pub mod scheduler;
pub mod state;

pub use driver::{run_job, DriverContext};
pub use feed::WorkerFeed;
pub use invoker::{HttpInvoker, TaskInvoker};
pub use scheduler::schedule;
