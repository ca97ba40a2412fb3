//! Dual-threshold reclamation policy.
//!
//! Pure: snapshot + thresholds in, ordered action plan out, no side effects.
//! Two passes with two tiers of severity:
//!
//! 1. **Critical pass** — restore the free-space floor. Trashing cannot help
//!    here (trash still occupies quota), so it escalates straight to
//!    permanent deletion: age-eligible trash oldest first, then managed
//!    items oldest first.
//! 2. **Comfort pass** — bring non-trash usage under the configured ceiling
//!    with the softer, reversible action: move the oldest remaining managed
//!    items to trash.
//!
//! Ordering ties (equal timestamps) break on ascending id so the plan is
//! reproducible across runs.

use crate::config::Thresholds;

use super::inventory::{Inventory, Item, TrashItem};

/// A single planned mutation of the remote account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Free the space for good. Critical pass only.
    PermanentDelete(Target),
    /// Reversible: the item keeps occupying quota until trash is purged.
    MoveToTrash(Target),
}

impl Action {
    pub fn target(&self) -> &Target {
        match self {
            Action::PermanentDelete(t) | Action::MoveToTrash(t) => t,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Action::PermanentDelete(_) => "permanently delete",
            Action::MoveToTrash(_) => "move to trash",
        }
    }
}

/// What an action operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: u64,
    pub name: String,
    pub size: u64,
    /// Whether the target currently sits in trash.
    pub from_trash: bool,
}

impl Target {
    fn item(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            size: item.size,
            from_trash: false,
        }
    }

    fn trash(entry: &TrashItem) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            size: entry.size,
            from_trash: true,
        }
    }
}

/// Which pass could not meet its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Critical,
    Comfort,
}

/// A threshold that remains unmet after all eligible candidates were planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub pass: Pass,
    /// Bytes still missing after every planned action takes effect.
    pub missing: u64,
}

/// Ordered action list plus the simulated end state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub shortfalls: Vec<Shortfall>,
    /// The under-age-trash escape hatch had to be used.
    pub used_young_trash: bool,
    /// Free space after all actions take effect.
    pub projected_free: u64,
    /// Non-trash usage after all actions take effect.
    pub projected_active: u64,
}

impl Plan {
    /// True when thresholds were already satisfied at snapshot time.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.shortfalls.is_empty()
    }
}

/// Compute the action plan for one reclamation run.
pub fn plan(inventory: &Inventory, thresholds: &Thresholds) -> Plan {
    let mut free = inventory.free();
    let mut active = inventory.active_used();
    let mut actions = Vec::new();
    let mut shortfalls = Vec::new();
    let mut used_young_trash = false;

    // Oldest first, id as the stable tie-break.
    let mut trash: Vec<&TrashItem> = inventory.trash.iter().collect();
    trash.sort_by(|a, b| (a.trashed_at, a.id).cmp(&(b.trashed_at, b.id)));
    let (eligible_trash, young_trash): (Vec<_>, Vec<_>) = trash
        .into_iter()
        .partition(|t| age_days(inventory, t) >= thresholds.min_trash_age_days);

    let mut items: Vec<&Item> = inventory.items.iter().collect();
    items.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    // One iterator across both passes: whatever the critical pass consumes
    // is automatically excluded from the comfort pass.
    let mut items = items.into_iter();

    // Critical pass: escalate to permanent deletion until the floor holds.
    if free < thresholds.critical_free {
        for entry in &eligible_trash {
            if free >= thresholds.critical_free {
                break;
            }
            actions.push(Action::PermanentDelete(Target::trash(entry)));
            free += entry.size;
        }

        while free < thresholds.critical_free {
            let Some(item) = items.next() else { break };
            actions.push(Action::PermanentDelete(Target::item(item)));
            free += item.size;
            active = active.saturating_sub(item.size);
        }

        if free < thresholds.critical_free && thresholds.delete_young_trash {
            for entry in &young_trash {
                if free >= thresholds.critical_free {
                    break;
                }
                actions.push(Action::PermanentDelete(Target::trash(entry)));
                free += entry.size;
                used_young_trash = true;
            }
        }

        if free < thresholds.critical_free {
            shortfalls.push(Shortfall {
                pass: Pass::Critical,
                missing: thresholds.critical_free - free,
            });
        }
    }

    // Comfort pass: only once the floor holds, and only the soft action.
    if shortfalls.is_empty()
        && let Some(ceiling) = thresholds.comfort_ceiling
    {
        while active > ceiling {
            let Some(item) = items.next() else {
                shortfalls.push(Shortfall {
                    pass: Pass::Comfort,
                    missing: active - ceiling,
                });
                break;
            };
            actions.push(Action::MoveToTrash(Target::item(item)));
            // Trash still occupies quota, so free space does not move.
            active = active.saturating_sub(item.size);
        }
    }

    Plan {
        actions,
        shortfalls,
        used_young_trash,
        projected_free: free,
        projected_active: active,
    }
}

fn age_days(inventory: &Inventory, entry: &TrashItem) -> i64 {
    (inventory.taken_at - entry.trashed_at).num_days()
}
