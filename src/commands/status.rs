use anyhow::Result;

use crate::cli::StatusArgs;
use crate::config::gb_to_bytes;
use crate::ui;

pub fn run(args: StatusArgs) -> Result<()> {
    let client = putio::Client::new(&args.token);
    let usage = client.account_info()?;

    let quota = usage.disk.size;
    let used = usage.disk.used;
    let free = quota.saturating_sub(used);
    let active = used.saturating_sub(usage.trash_size);

    ui::header("Account Usage");
    ui::kv("quota", &ui::format_size(quota));
    ui::kv("used", &ui::format_size(used));
    ui::kv("trash", &ui::format_size(usage.trash_size));
    ui::kv("active (non-trash)", &ui::format_size(active));
    ui::kv("free", &ui::format_size(free));

    println!();
    let critical_free = gb_to_bytes(args.critical_free_gb)?;
    if free < critical_free {
        ui::warn(&format!(
            "free space below the critical floor of {}",
            ui::format_size(critical_free)
        ));
    } else {
        ui::success(&format!(
            "free space meets the critical floor of {}",
            ui::format_size(critical_free)
        ));
    }

    if args.comfort_used_gb != 0.0 {
        let ceiling = gb_to_bytes(args.comfort_used_gb)?;
        if active > ceiling {
            ui::warn(&format!(
                "active usage above the comfort ceiling of {}",
                ui::format_size(ceiling)
            ));
        } else {
            ui::success(&format!(
                "active usage within the comfort ceiling of {}",
                ui::format_size(ceiling)
            ));
        }
    }

    Ok(())
}
