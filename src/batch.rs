//! Concurrent resolution of many employees.
//!
//! Resolutions for different employees share nothing but the engine and the
//! sources, both read-only, so they run in parallel on tokio's blocking pool.
//! Each one is bounded by a timeout; a failure or timeout is reported for
//! that employee alone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::engine::WorkEntryEngine;
use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeRef, ResolutionResult, ResolutionWindow};
use crate::sources::ScheduleSources;

/// The outcome of one employee's resolution in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The employee the outcome belongs to.
    pub employee_id: String,
    /// The resolution, or why it failed.
    pub result: EngineResult<ResolutionResult>,
}

/// Resolves every employee over the same window.
///
/// Outcomes are returned in the order of `employees`. A resolution running
/// longer than `timeout` is reported as `ResolutionTimeout`; the blocking
/// task itself cannot be interrupted and finishes in the background.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use work_entry_engine::batch::resolve_batch;
/// use work_entry_engine::engine::WorkEntryEngine;
/// use work_entry_engine::models::{EmployeeRef, ResolutionWindow};
/// use work_entry_engine::sources::InMemorySources;
/// use chrono::{TimeZone, Utc};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let engine = Arc::new(WorkEntryEngine::from_config_dir("./config/default").unwrap());
/// let window = ResolutionWindow::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
/// let employees = vec![EmployeeRef::new("emp_001", chrono_tz::UTC)];
///
/// let outcomes = resolve_batch(
///     engine,
///     Arc::new(InMemorySources::new()),
///     employees,
///     window,
///     Duration::from_secs(5),
/// )
/// .await;
/// assert!(outcomes[0].result.is_ok());
/// # });
/// ```
pub async fn resolve_batch<S>(
    engine: Arc<WorkEntryEngine>,
    sources: Arc<S>,
    employees: Vec<EmployeeRef>,
    window: ResolutionWindow,
    timeout: Duration,
) -> Vec<BatchOutcome>
where
    S: ScheduleSources + 'static,
{
    let start_time = Instant::now();
    let total = employees.len();
    let ids: Vec<String> = employees.iter().map(|employee| employee.id.clone()).collect();
    let mut join_set: JoinSet<(usize, EngineResult<ResolutionResult>)> = JoinSet::new();

    for (index, employee) in employees.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        let sources = Arc::clone(&sources);
        join_set.spawn(async move {
            let employee_id = employee.id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                engine.resolve(sources.as_ref(), &employee, &window)
            });

            let result = match tokio::time::timeout(timeout, handle).await {
                Ok(join_result) => match join_result {
                    Ok(result) => result,
                    Err(e) => Err(EngineError::WorkerFailed {
                        employee_id,
                        message: e.to_string(),
                    }),
                },
                Err(_) => Err(EngineError::ResolutionTimeout {
                    employee_id,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            (index, result)
        });
    }

    let mut results: Vec<Option<EngineResult<ResolutionResult>>> =
        std::iter::repeat_with(|| None).take(total).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!(error = %e, "Batch worker task failed"),
        }
    }

    let outcomes: Vec<BatchOutcome> = ids
        .into_iter()
        .zip(results)
        .map(|(employee_id, result)| {
            let result = result.unwrap_or_else(|| {
                Err(EngineError::WorkerFailed {
                    employee_id: employee_id.clone(),
                    message: "worker task did not report a result".to_string(),
                })
            });
            if let Err(err) = &result {
                warn!(employee_id = %employee_id, error = %err, "Employee resolution failed");
            }
            BatchOutcome {
                employee_id,
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        employees = total,
        failed = failed,
        duration_us = start_time.elapsed().as_micros() as u64,
        "Batch resolution completed"
    );

    outcomes
}
