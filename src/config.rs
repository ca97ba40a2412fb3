use anyhow::{Result, bail};

const GB: u64 = 1024 * 1024 * 1024;

/// Convert a GB figure from the CLI/environment into bytes.
///
/// Rejects negative and non-finite values before any remote call is made.
pub fn gb_to_bytes(gb: f64) -> Result<u64> {
    if !gb.is_finite() {
        bail!("threshold must be a finite number of GB, got {gb}");
    }
    if gb < 0.0 {
        bail!("threshold cannot be negative, got {gb} GB");
    }
    Ok((gb * GB as f64) as u64)
}

/// The policy configuration for one reclamation run. Immutable once built;
/// the planner reads no ambient state beyond this.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Minimum free space (bytes). Trash counts as used space until purged.
    pub critical_free: u64,
    /// Target ceiling for non-trash usage (bytes). `None` disables the
    /// comfort pass.
    pub comfort_ceiling: Option<u64>,
    /// Trash entries younger than this are not purged under normal pressure.
    pub min_trash_age_days: i64,
    /// Root folder names the engine is allowed to touch.
    pub managed_folders: Vec<String>,
    /// Escape hatch: consume under-age trash when nothing else is left and
    /// the critical floor is still unmet. Flagged in the run report.
    pub delete_young_trash: bool,
}

impl Thresholds {
    /// Reject configurations that could never produce a sane plan.
    pub fn validate(&self) -> Result<()> {
        if self.min_trash_age_days < 0 {
            bail!(
                "minimum trash age cannot be negative, got {} days",
                self.min_trash_age_days
            );
        }
        if self.managed_folders.is_empty() {
            bail!("at least one managed folder name is required");
        }
        if let Some(name) = self.managed_folders.iter().find(|n| n.trim().is_empty()) {
            bail!("managed folder names cannot be blank, got {name:?}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Thresholds {
        Thresholds {
            critical_free: 10 * GB,
            comfort_ceiling: Some(90 * GB),
            min_trash_age_days: 2,
            managed_folders: vec!["chill.institute".to_string(), "putfirst".to_string()],
            delete_young_trash: false,
        }
    }

    #[test]
    fn test_gb_to_bytes() {
        assert_eq!(gb_to_bytes(1.0).unwrap(), GB);
        assert_eq!(gb_to_bytes(0.0).unwrap(), 0);
        assert_eq!(gb_to_bytes(2.5).unwrap(), 2 * GB + GB / 2);
    }

    #[test]
    fn test_gb_to_bytes_rejects_negative() {
        assert!(gb_to_bytes(-1.0).is_err());
    }

    #[test]
    fn test_gb_to_bytes_rejects_nan_and_infinity() {
        assert!(gb_to_bytes(f64::NAN).is_err());
        assert!(gb_to_bytes(f64::INFINITY).is_err());
    }

    #[test]
    fn test_valid_thresholds() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_trash_age() {
        let mut t = valid();
        t.min_trash_age_days = -1;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_folder_list() {
        let mut t = valid();
        t.managed_folders.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_folder_name() {
        let mut t = valid();
        t.managed_folders.push("  ".to_string());
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_no_ceiling_is_fine() {
        let mut t = valid();
        t.comfort_ceiling = None;
        assert!(t.validate().is_ok());
    }
}
