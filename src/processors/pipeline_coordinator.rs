use crate::error::{ProcessingError, Result};
use crate::models::AggregationTensor;
use crate::utils::constants::{DEFAULT_FETCH_RETRIES, DEFAULT_RETRY_BACKOFF_MS};
use crate::utils::progress::ProgressReporter;
use crossbeam::channel;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fans partitions out over a bounded worker pool and reassembles their
/// tensors in partition order, whatever order they complete in.
pub struct PipelineCoordinator {
    max_workers: usize,
    fetch_retries: u32,
    retry_backoff: Duration,
}

impl PipelineCoordinator {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            fetch_retries: DEFAULT_FETCH_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }

    pub fn with_fetch_retries(mut self, fetch_retries: u32) -> Self {
        self.fetch_retries = fetch_retries;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetch and aggregate every partition, then concatenate the results along
    /// the time axis in the order `partitions` were given.
    ///
    /// The first failure stops partitions that have not started yet; the error
    /// returned names the lowest-indexed failing partition.
    pub fn run<P, S, F, A>(
        &self,
        partitions: &[P],
        fetch: F,
        aggregate: A,
        progress: Option<&ProgressReporter>,
    ) -> Result<AggregationTensor>
    where
        P: Display + Sync,
        F: Fn(&P) -> Result<S> + Sync,
        A: Fn(&P, S) -> Result<AggregationTensor> + Sync,
    {
        let tensors = self.run_partitions(partitions, fetch, aggregate, progress)?;
        AggregationTensor::concatenate(tensors)
    }

    /// Per-partition tensors, ordered by partition index
    pub fn run_partitions<P, S, F, A>(
        &self,
        partitions: &[P],
        fetch: F,
        aggregate: A,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<AggregationTensor>>
    where
        P: Display + Sync,
        F: Fn(&P) -> Result<S> + Sync,
        A: Fn(&P, S) -> Result<AggregationTensor> + Sync,
    {
        if partitions.is_empty() {
            return Err(ProcessingError::MissingData(
                "No partitions to process".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        info!(
            partitions = partitions.len(),
            workers = self.max_workers,
            "Dispatching partitions"
        );
        if let Some(p) = progress {
            p.set_message(&format!("Aggregating {} partitions...", partitions.len()));
        }

        let (sender, receiver) = channel::unbounded::<(usize, Result<AggregationTensor>)>();
        let abort = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);

        pool.scope(|scope| {
            for (index, partition) in partitions.iter().enumerate() {
                let sender = sender.clone();
                let (abort, completed, fetch, aggregate) = (&abort, &completed, &fetch, &aggregate);

                scope.spawn(move |_| {
                    if abort.load(Ordering::Acquire) {
                        let _ = sender.send((index, Err(ProcessingError::Cancelled)));
                        return;
                    }

                    let result = self
                        .fetch_with_retry(partition, fetch)
                        .and_then(|stream| aggregate(partition, stream))
                        .map_err(|e| ProcessingError::PartitionFailed {
                            partition: partition.to_string(),
                            source: Box::new(e),
                        });

                    if let Err(e) = &result {
                        warn!(partition = %partition, error = %e, "Partition failed, aborting run");
                        abort.store(true, Ordering::Release);
                    } else {
                        debug!(partition = %partition, "Partition complete");
                    }

                    let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    let _ = sender.send((index, result));
                });
            }
        });
        drop(sender);

        let mut slots: Vec<Option<AggregationTensor>> = (0..partitions.len()).map(|_| None).collect();
        let mut failures: Vec<(usize, ProcessingError)> = Vec::new();
        for (index, result) in receiver.iter() {
            match result {
                Ok(tensor) => slots[index] = Some(tensor),
                Err(e) => failures.push((index, e)),
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        if let Some((_, error)) = failures
            .into_iter()
            .find(|(_, e)| !matches!(e, ProcessingError::Cancelled))
        {
            return Err(error);
        }

        let tensors = slots
            .into_iter()
            .zip(partitions)
            .map(|(slot, partition)| {
                slot.ok_or_else(|| {
                    ProcessingError::MissingData(format!("No result for partition {}", partition))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} partitions", tensors.len()));
        }

        Ok(tensors)
    }

    fn fetch_with_retry<P, S, F>(&self, partition: &P, fetch: &F) -> Result<S>
    where
        P: Display,
        F: Fn(&P) -> Result<S>,
    {
        let mut attempt = 0;
        loop {
            match fetch(partition) {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < self.fetch_retries => {
                    attempt += 1;
                    warn!(
                        partition = %partition,
                        attempt,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    std::thread::sleep(self.retry_backoff * attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for PipelineCoordinator {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
