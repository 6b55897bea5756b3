//! QueryAggregator: fan out one point to every configured lookup task,
//! join on all of them, and assemble the report
//!
//! The join is `join_all`, not a counter: each task owns its slot and
//! settles it exactly once, so no mutual exclusion is needed on report
//! state. A task failure or timeout settles `Failed` for its own slot
//! and never cancels siblings.

use futures_util::future::join_all;
use indexmap::IndexMap;
use metrics::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::geometry::GeoPoint;
use crate::lookup::{LookupOutcome, LookupStrategy};
use crate::report::{Report, ReportAssembler, ReportLayout};

/// Errors raised while wiring an aggregator
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Task key '{0}' is not a declared report slot")]
    UnknownSlot(String),

    #[error("Declared slot '{0}' has no lookup task")]
    MissingTask(String),
}

/// Aggregates concurrent per-source lookups into a single report
pub struct QueryAggregator {
    layout: Arc<ReportLayout>,
    tasks: IndexMap<String, Arc<dyn LookupStrategy>>,
    assembler: ReportAssembler,
    task_timeout: Duration,
    /// Generation stamp of the most recently started aggregation
    generation: AtomicU64,
    /// Number of aggregations currently outstanding
    in_flight: AtomicUsize,
    busy_tx: watch::Sender<bool>,
}

impl QueryAggregator {
    /// Build an aggregator over a slot layout and its lookup tasks.
    ///
    /// Every task key must be a declared slot and every declared slot
    /// must have a task, so each query settles each slot exactly once.
    pub fn new(
        layout: Arc<ReportLayout>,
        tasks: IndexMap<String, Arc<dyn LookupStrategy>>,
        assembler: ReportAssembler,
        task_timeout: Duration,
    ) -> Result<Self, AggregateError> {
        for key in tasks.keys() {
            if !layout.contains(key) {
                return Err(AggregateError::UnknownSlot(key.clone()));
            }
        }
        for key in layout.keys() {
            if !tasks.contains_key(key) {
                return Err(AggregateError::MissingTask(key.to_string()));
            }
        }

        let (busy_tx, _) = watch::channel(false);
        Ok(Self {
            layout,
            tasks,
            assembler,
            task_timeout,
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            busy_tx,
        })
    }

    /// Single started/finished busy indicator for the whole aggregation,
    /// intended to drive a loading spinner. Flips once per aggregation,
    /// not per task.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Generation stamp of the most recently started aggregation
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether a report from `generation` is still the newest one.
    ///
    /// Display code must check this before rendering: a slow aggregation
    /// may finish after a newer query point was submitted, and only the
    /// most recently started aggregation is allowed to render.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest_generation()
    }

    /// Run every lookup task for `point` concurrently and assemble the
    /// report once all slots have settled.
    pub async fn aggregate(&self, point: GeoPoint) -> Report {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let start = Instant::now();
        counter!("geoprobe_point_queries_total").increment(1);
        self.set_busy(1);

        info!(
            generation,
            lat = point.lat,
            lon = point.lon,
            slots = self.layout.len(),
            "starting point query"
        );

        let futures = self.tasks.iter().map(|(key, strategy)| {
            let key = key.clone();
            let strategy = strategy.clone();
            let task_timeout = self.task_timeout;
            async move {
                let outcome = match tokio::time::timeout(task_timeout, strategy.lookup(point)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => LookupOutcome::failed("timed out"),
                };
                debug!(slot = %key, outcome = outcome.kind(), "slot settled");
                counter!("geoprobe_slot_outcomes_total", "outcome" => outcome.kind()).increment(1);
                (key, outcome)
            }
        });

        let settled: HashMap<String, LookupOutcome> = join_all(futures).await.into_iter().collect();
        debug_assert_eq!(settled.len(), self.layout.len());

        let report = self.assembler.assemble(generation, point, &settled);

        histogram!("geoprobe_query_duration_seconds").record(start.elapsed());
        self.set_busy(-1);
        info!(generation, "point query finished");

        report
    }

    fn set_busy(&self, delta: isize) {
        let count = if delta > 0 {
            self.in_flight.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1
        };
        let _ = self.busy_tx.send(count > 0);
    }
}
