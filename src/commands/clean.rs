use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::CleanArgs;
use crate::config::{Thresholds, gb_to_bytes};
use crate::engine::executor::FailedAction;
use crate::engine::planner::{Pass, Shortfall};
use crate::engine::retry::RetryPolicy;
use crate::engine::{self, ExecuteOptions, RunOutcome, RunReport};
use crate::ui;

pub fn run(args: CleanArgs) -> Result<()> {
    if args.max_retries == 0 {
        bail!("--max-retries must be at least 1 (it counts total attempts)");
    }
    let thresholds = thresholds_from_args(&args)?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        retry: RetryPolicy {
            max_attempts: args.max_retries,
            delay: Duration::from_secs(args.retry_delay_secs),
        },
    };

    let client = putio::Client::new(&args.token);
    let report = engine::run(&client, &thresholds, &opts)?;
    print_report(&report);

    if report.outcome == RunOutcome::PartiallyFailed {
        bail!("{} action(s) failed", report.failed.len());
    }
    Ok(())
}

fn thresholds_from_args(args: &CleanArgs) -> Result<Thresholds> {
    let comfort_ceiling = if args.comfort_used_gb == 0.0 {
        None
    } else {
        Some(gb_to_bytes(args.comfort_used_gb)?)
    };
    let thresholds = Thresholds {
        critical_free: gb_to_bytes(args.critical_free_gb)?,
        comfort_ceiling,
        min_trash_age_days: args.min_trash_age_days,
        managed_folders: args.folders.clone(),
        delete_young_trash: args.delete_young_trash,
    };
    thresholds.validate()?;
    Ok(thresholds)
}

fn print_report(report: &RunReport) {
    if report.dry_run {
        ui::header("Reclamation Plan (dry run)");
    } else {
        ui::header("Reclamation Run");
    }

    if report.outcome == RunOutcome::NoActionNeeded {
        ui::success("thresholds already satisfied, nothing to do");
        ui::kv("free space", &ui::format_size(report.free_before));
        return;
    }

    for action in &report.succeeded {
        let target = action.target();
        let label = format!(
            "{} {} ({})",
            action.verb(),
            target.name,
            ui::format_size(target.size)
        );
        if report.dry_run {
            ui::dim(&format!("would {label}"));
        } else {
            ui::success(&label);
        }
    }
    for failure in &report.failed {
        print_failure(failure);
    }

    println!();
    ui::kv("planned", &report.planned.to_string());
    ui::kv("succeeded", &report.succeeded.len().to_string());
    if report.skipped > 0 {
        ui::kv("skipped", &report.skipped.to_string());
    }
    if !report.failed.is_empty() {
        ui::kv("failed", &report.failed.len().to_string());
    }
    ui::kv("freed", &ui::format_size(report.bytes_freed));
    if report.bytes_trashed > 0 {
        ui::kv("moved to trash", &ui::format_size(report.bytes_trashed));
    }
    ui::kv("free before", &ui::format_size(report.free_before));
    match report.free_after_actual {
        Some(actual) => ui::kv("free after", &ui::format_size(actual)),
        None => ui::kv(
            "free after (est.)",
            &ui::format_size(report.free_after_estimate),
        ),
    }

    if report.used_young_trash {
        ui::warn("deleted trash younger than the configured minimum age");
    }
    for shortfall in &report.shortfalls {
        print_shortfall(shortfall);
    }
}

fn print_failure(failure: &FailedAction) {
    let target = failure.action.target();
    ui::error(&format!(
        "failed to {} {} after {} attempt(s): {}",
        failure.action.verb(),
        target.name,
        failure.attempts,
        failure.error
    ));
}

fn print_shortfall(shortfall: &Shortfall) {
    let pass = match shortfall.pass {
        Pass::Critical => "critical",
        Pass::Comfort => "comfort",
    };
    ui::warn(&format!(
        "{} threshold unreachable: {} short with no eligible candidates left",
        pass,
        ui::format_size(shortfall.missing)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    fn args() -> CleanArgs {
        CleanArgs {
            token: "t".to_string(),
            critical_free_gb: 10.0,
            comfort_used_gb: 0.0,
            min_trash_age_days: 2,
            folders: vec!["downloads".to_string()],
            max_retries: 3,
            retry_delay_secs: 5,
            dry_run: false,
            delete_young_trash: false,
        }
    }

    #[test]
    fn test_zero_comfort_disables_ceiling() {
        let t = thresholds_from_args(&args()).unwrap();
        assert_eq!(t.comfort_ceiling, None);
        assert_eq!(t.critical_free, 10 * GB);
    }

    #[test]
    fn test_comfort_value_becomes_ceiling() {
        let mut a = args();
        a.comfort_used_gb = 90.0;
        let t = thresholds_from_args(&a).unwrap();
        assert_eq!(t.comfort_ceiling, Some(90 * GB));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut a = args();
        a.critical_free_gb = -1.0;
        assert!(thresholds_from_args(&a).is_err());

        let mut a = args();
        a.folders.clear();
        assert!(thresholds_from_args(&a).is_err());
    }
}
