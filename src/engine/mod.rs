//! Reclamation engine: snapshot, policy, execution.
//!
//! The pieces are layered so the policy stays pure and testable:
//! [`inventory`] builds a read-only snapshot of the account, [`planner`]
//! turns snapshot + thresholds into an ordered action list, and [`executor`]
//! applies the list through [`retry`] against anything implementing
//! [`Storage`].

pub mod executor;
pub mod inventory;
pub mod planner;
pub mod retry;

use anyhow::Result;

use crate::config::Thresholds;
pub use executor::{ExecuteOptions, RunOutcome, RunReport};
pub use inventory::Inventory;

/// The remote calls the engine consumes. Implemented by [`putio::Client`];
/// tests substitute a scripted mock.
pub trait Storage {
    /// Quota, used space, and trash size.
    fn account_usage(&self) -> putio::Result<putio::AccountUsage>;
    /// Direct children of a folder (0 = account root).
    fn list_folder(&self, parent_id: u64) -> putio::Result<Vec<putio::File>>;
    /// Trashed entries; `created_at` is the trash timestamp.
    fn list_trash(&self) -> putio::Result<Vec<putio::File>>;
    /// Move a file or folder subtree to trash (reversible).
    fn move_to_trash(&self, file_id: u64) -> putio::Result<()>;
    /// Permanently delete a trashed entry.
    fn delete_from_trash(&self, file_id: u64) -> putio::Result<()>;
    /// Permanently delete a live entry, bypassing trash.
    fn delete_permanently(&self, file_id: u64) -> putio::Result<()>;
}

impl Storage for putio::Client {
    fn account_usage(&self) -> putio::Result<putio::AccountUsage> {
        self.account_info()
    }

    fn list_folder(&self, parent_id: u64) -> putio::Result<Vec<putio::File>> {
        self.list_folder(parent_id)
    }

    fn list_trash(&self) -> putio::Result<Vec<putio::File>> {
        self.list_trash()
    }

    fn move_to_trash(&self, file_id: u64) -> putio::Result<()> {
        self.move_to_trash(file_id)
    }

    fn delete_from_trash(&self, file_id: u64) -> putio::Result<()> {
        self.delete_from_trash(file_id)
    }

    fn delete_permanently(&self, file_id: u64) -> putio::Result<()> {
        self.delete_permanently(file_id)
    }
}

/// One full reclamation pass: snapshot, plan, execute.
///
/// Thresholds are validated before any remote call is made.
pub fn run(
    storage: &impl Storage,
    thresholds: &Thresholds,
    opts: &ExecuteOptions,
) -> Result<RunReport> {
    thresholds.validate()?;
    let inventory = Inventory::snapshot(storage, &thresholds.managed_folders, &opts.retry)?;
    let plan = planner::plan(&inventory, thresholds);
    executor::execute(storage, &inventory, plan, thresholds, opts)
}
