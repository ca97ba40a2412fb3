//! Reclamation driver: applies a plan against the remote account.
//!
//! Actions run strictly one at a time. The driver keeps a running
//! free-space/active-usage model, re-checks before every action whether its
//! threshold is already satisfied, and keeps going past individual failures.
//! Only a fatal error (rejected credentials) aborts the run.

use anyhow::Result;

use crate::config::Thresholds;

use super::Storage;
use super::inventory::Inventory;
use super::planner::{Action, Plan, Shortfall};
use super::retry::{RetryPolicy, with_retry};

/// Options for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Log decisions and apply simulated accounting only; zero mutating calls.
    pub dry_run: bool,
    /// Retry bounds for every remote call.
    pub retry: RetryPolicy,
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every planned action was attempted and succeeded.
    Completed,
    /// At least one action failed after exhausting retries.
    PartiallyFailed,
    /// Thresholds were already satisfied at snapshot time.
    NoActionNeeded,
}

/// An action that failed after its retries were exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAction {
    pub action: Action,
    pub error: String,
    pub attempts: u32,
}

/// Everything an operator needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub dry_run: bool,
    /// Actions the policy planned.
    pub planned: usize,
    pub succeeded: Vec<Action>,
    pub failed: Vec<FailedAction>,
    /// Actions skipped because their threshold was already met mid-run.
    pub skipped: usize,
    pub shortfalls: Vec<Shortfall>,
    /// The under-age-trash escape hatch was exercised.
    pub used_young_trash: bool,
    /// Free space at snapshot time.
    pub free_before: u64,
    /// Free space per the driver's running model.
    pub free_after_estimate: u64,
    /// Free space re-fetched from the account after a live run, when the
    /// re-fetch succeeded.
    pub free_after_actual: Option<u64>,
    /// Bytes permanently freed (permanent deletions only).
    pub bytes_freed: u64,
    /// Bytes moved to trash (still occupying quota).
    pub bytes_trashed: u64,
}

/// Apply the plan. Individual failures are recorded and the run continues;
/// a fatal remote error aborts immediately.
pub fn execute(
    storage: &impl Storage,
    inventory: &Inventory,
    plan: Plan,
    thresholds: &Thresholds,
    opts: &ExecuteOptions,
) -> Result<RunReport> {
    let free_before = inventory.free();
    let mut report = RunReport {
        outcome: RunOutcome::NoActionNeeded,
        dry_run: opts.dry_run,
        planned: plan.actions.len(),
        succeeded: Vec::new(),
        failed: Vec::new(),
        skipped: 0,
        shortfalls: plan.shortfalls,
        used_young_trash: plan.used_young_trash,
        free_before,
        free_after_estimate: free_before,
        free_after_actual: None,
        bytes_freed: 0,
        bytes_trashed: 0,
    };

    if plan.actions.is_empty() && report.shortfalls.is_empty() {
        log::info!("thresholds already satisfied, nothing to do");
        return Ok(report);
    }
    log::info!(
        "plan: {} action(s), projected free {} / active {}",
        plan.actions.len(),
        plan.projected_free,
        plan.projected_active
    );

    let mut free = free_before;
    let mut active = inventory.active_used();

    for action in plan.actions {
        // The plan simulated each action's effect; re-check against the
        // running model so earlier successes can retire later actions.
        if !still_needed(&action, free, active, thresholds) {
            log::debug!(
                "threshold already met, skipping: {} {:?}",
                action.verb(),
                action.target().name
            );
            report.skipped += 1;
            continue;
        }

        let target = action.target().clone();
        if opts.dry_run {
            log::info!(
                "[dry-run] would {} {:?} ({} bytes)",
                action.verb(),
                target.name,
                target.size
            );
            apply_accounting(&action, &mut free, &mut active, &mut report);
            report.succeeded.push(action);
            continue;
        }

        log::info!("{} {:?} ({} bytes)", action.verb(), target.name, target.size);
        let result = with_retry(&opts.retry, || match &action {
            Action::MoveToTrash(t) => storage.move_to_trash(t.id),
            Action::PermanentDelete(t) if t.from_trash => storage.delete_from_trash(t.id),
            Action::PermanentDelete(t) => storage.delete_permanently(t.id),
        });

        match result {
            Ok(()) => {
                // put.io's delete endpoints return no usage figures, so the
                // model advances by the simulated delta.
                apply_accounting(&action, &mut free, &mut active, &mut report);
                report.succeeded.push(action);
            }
            Err(err) if err.error.is_fatal() => {
                return Err(
                    anyhow::Error::new(err).context("fatal put.io error, aborting the run")
                );
            }
            Err(err) => {
                log::error!("failed to {} {:?}: {}", action.verb(), target.name, err);
                report.failed.push(FailedAction {
                    action,
                    error: format!("{} ({})", err.error, err.error.class()),
                    attempts: err.attempts,
                });
            }
        }
    }

    report.free_after_estimate = free;
    report.outcome = if report.failed.is_empty() {
        RunOutcome::Completed
    } else {
        RunOutcome::PartiallyFailed
    };

    // Best effort: ask the account for the real post-run figures.
    if !opts.dry_run && !report.succeeded.is_empty() {
        match with_retry(&opts.retry, || storage.account_usage()) {
            Ok(usage) => {
                report.free_after_actual = Some(usage.disk.size.saturating_sub(usage.disk.used));
            }
            Err(err) => log::warn!("could not re-fetch account usage after run: {err}"),
        }
    }

    Ok(report)
}

/// Whether an action's threshold is still unmet per the running model.
fn still_needed(action: &Action, free: u64, active: u64, thresholds: &Thresholds) -> bool {
    match action {
        Action::PermanentDelete(_) => free < thresholds.critical_free,
        Action::MoveToTrash(_) => thresholds.comfort_ceiling.is_some_and(|c| active > c),
    }
}

fn apply_accounting(action: &Action, free: &mut u64, active: &mut u64, report: &mut RunReport) {
    let size = action.target().size;
    match action {
        Action::PermanentDelete(t) => {
            *free += size;
            if !t.from_trash {
                *active = active.saturating_sub(size);
            }
            report.bytes_freed += size;
        }
        Action::MoveToTrash(_) => {
            // Free space unchanged: the trashed bytes still occupy quota.
            *active = active.saturating_sub(size);
            report.bytes_trashed += size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner;
    use crate::engine::testing::{Call, MockStorage, file, ts};
    use putio::FileType;
    use std::time::Duration;

    const GB: u64 = 1024 * 1024 * 1024;

    fn opts(dry_run: bool) -> ExecuteOptions {
        ExecuteOptions {
            dry_run,
            retry: RetryPolicy {
                max_attempts: 2,
                delay: Duration::ZERO,
            },
        }
    }

    fn thresholds(critical_gb: u64, ceiling_gb: Option<u64>) -> Thresholds {
        Thresholds {
            critical_free: critical_gb * GB,
            comfort_ceiling: ceiling_gb.map(|g| g * GB),
            min_trash_age_days: 2,
            managed_folders: vec!["downloads".to_string()],
            delete_young_trash: false,
        }
    }

    /// Account with 2 GB free, 3 GB of month-old trash, and two managed
    /// video files (4 GB from January, 2 GB from February).
    fn pressured_mock() -> MockStorage {
        let mut mock = MockStorage::new(100 * GB, 98 * GB, 3 * GB);
        mock.folders.insert(
            0,
            vec![file(
                10,
                "downloads",
                0,
                "2023-12-01T00:00:00",
                FileType::Folder,
            )],
        );
        mock.folders.insert(
            10,
            vec![
                file(11, "jan.mkv", 4 * GB, "2024-01-01T00:00:00", FileType::Video),
                file(12, "feb.mkv", 2 * GB, "2024-02-01T00:00:00", FileType::Video),
            ],
        );
        mock.trash = vec![file(
            50,
            "old.mkv",
            3 * GB,
            "2024-01-15T00:00:00",
            FileType::Video,
        )];
        mock
    }

    fn snapshot(mock: &MockStorage) -> Inventory {
        let mut inv = Inventory::snapshot(
            mock,
            &["downloads".to_string()],
            &RetryPolicy {
                max_attempts: 1,
                delay: Duration::ZERO,
            },
        )
        .unwrap();
        // Pin the snapshot time so trash ages are stable.
        inv.taken_at = ts("2024-06-15T12:00:00");
        inv
    }

    #[test]
    fn test_no_action_needed_makes_no_mutating_calls() {
        let mut mock = MockStorage::new(100 * GB, 50 * GB, 0);
        mock.folders.insert(0, vec![]);
        let inv = snapshot(&mock);
        let t = thresholds(10, Some(90));
        let plan = planner::plan(&inv, &t);
        let report = execute(&mock, &inv, plan, &t, &opts(false)).unwrap();
        assert_eq!(report.outcome, RunOutcome::NoActionNeeded);
        assert_eq!(mock.mutating_calls(), 0);
    }

    #[test]
    fn test_live_run_deletes_trash_then_oldest_item() {
        let mock = pressured_mock();
        let inv = snapshot(&mock);
        let t = thresholds(6, None);
        let plan = planner::plan(&inv, &t);
        let report = execute(&mock, &inv, plan, &t, &opts(false)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        // Trash purge (3 GB, free 2 -> 5) then the January file (free 5 -> 9).
        let calls = mock.calls.borrow();
        assert!(calls.contains(&Call::DeleteFromTrash(50)));
        assert!(calls.contains(&Call::DeletePermanently(11)));
        assert!(!calls.iter().any(|c| matches!(c, Call::MoveToTrash(_))));
        drop(calls);
        assert_eq!(report.bytes_freed, 7 * GB);
        assert_eq!(report.free_after_estimate, 9 * GB);
    }

    #[test]
    fn test_dry_run_performs_zero_mutating_calls() {
        let mock = pressured_mock();
        let inv = snapshot(&mock);
        let t = thresholds(6, Some(90));
        let plan = planner::plan(&inv, &t);
        let report = execute(&mock, &inv, plan, &t, &opts(true)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(!report.succeeded.is_empty());
        assert_eq!(mock.mutating_calls(), 0);
        assert!(report.free_after_actual.is_none());
    }

    #[test]
    fn test_dry_run_is_idempotent() {
        let mock = pressured_mock();
        let inv = snapshot(&mock);
        let t = thresholds(6, Some(90));
        let first = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(true)).unwrap();
        let second = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(true)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dry_run_decisions_match_live_run() {
        let mock = pressured_mock();
        let inv = snapshot(&mock);
        let t = thresholds(6, Some(90));
        let dry = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(true)).unwrap();
        let live_mock = pressured_mock();
        let live = execute(&live_mock, &inv, planner::plan(&inv, &t), &t, &opts(false)).unwrap();
        assert_eq!(dry.succeeded, live.succeeded);
        assert_eq!(dry.free_after_estimate, live.free_after_estimate);
    }

    #[test]
    fn test_transient_failure_is_retried_then_succeeds() {
        let mock = pressured_mock();
        mock.fail_next(50, vec![putio::Error::RateLimited]);
        let inv = snapshot(&mock);
        let t = thresholds(6, None);
        let report = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(false)).unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        // Two attempts on the trash entry.
        let trash_calls = mock
            .calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::DeleteFromTrash(50)))
            .count();
        assert_eq!(trash_calls, 2);
    }

    #[test]
    fn test_exhausted_retries_continue_with_next_candidate() {
        let mock = pressured_mock();
        mock.fail_next(
            50,
            vec![
                putio::Error::Transport("timeout".to_string()),
                putio::Error::Transport("timeout".to_string()),
            ],
        );
        let inv = snapshot(&mock);
        let t = thresholds(6, None);
        let report = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(false)).unwrap();

        assert_eq!(report.outcome, RunOutcome::PartiallyFailed);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].attempts, 2);
        // The recorded error carries its retry classification.
        assert!(report.failed[0].error.contains("(transient)"));
        // The run moved on to the managed item despite the trash failure.
        assert!(mock.calls.borrow().contains(&Call::DeletePermanently(11)));
    }

    #[test]
    fn test_fatal_error_aborts_run() {
        let mock = pressured_mock();
        mock.fail_next(50, vec![putio::Error::Unauthorized { status: 401 }]);
        let inv = snapshot(&mock);
        let t = thresholds(6, None);
        let result = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(false));
        assert!(result.is_err());
        // Nothing after the failing action was attempted.
        assert!(!mock.calls.borrow().contains(&Call::DeletePermanently(11)));
    }

    #[test]
    fn test_live_run_refetches_final_usage() {
        let mock = pressured_mock();
        let inv = snapshot(&mock);
        let t = thresholds(6, None);
        let report = execute(&mock, &inv, planner::plan(&inv, &t), &t, &opts(false)).unwrap();
        // The mock reports static figures; the point is that the re-fetch
        // happened and was recorded.
        assert_eq!(report.free_after_actual, Some(2 * GB));
    }
}
