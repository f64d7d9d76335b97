use common::{EngineError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Fork-join pool running one task per entity.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// `workers == 0` lets rayon pick one thread per CPU.
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("forecast-worker-{i}"))
            .build()
            .map_err(|e| EngineError::ConfigError(format!("cannot start worker pool: {e}")))?;
        debug!(threads = pool.current_num_threads(), "Worker pool ready");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `task` to every item in parallel. Results keep input order.
    pub fn map<I, T, F>(&self, items: &[I], task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(task).collect())
    }
}
