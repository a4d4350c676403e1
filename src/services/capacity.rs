//! Task capacity governance.
//!
//! A user may hold at most `CAPACITY_CEILING` active tasks. When a batch of
//! incoming tasks would breach the ceiling, the governor evicts pending
//! tasks down toward `EVICTION_TARGET_FLOOR`, lowest urgency first, then
//! oldest first. In-progress tasks are never evicted.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskStatus};
use crate::domain::ports::TaskRepository;

/// Maximum active (pending or in-progress) tasks per user.
pub const CAPACITY_CEILING: usize = 15;

/// Eviction drains pending tasks down toward this floor, keeping room for
/// a handful of fresh tasks after each generation round.
pub const EVICTION_TARGET_FLOOR: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    pub ceiling: usize,
    pub target_floor: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            ceiling: CAPACITY_CEILING,
            target_floor: EVICTION_TARGET_FLOOR,
        }
    }
}

/// Select tasks to cancel so `incoming` new tasks fit under the ceiling.
///
/// Pure: no-op when there is room; otherwise picks
/// `min(incoming, current - (ceiling - floor))` pending tasks ordered by
/// lowest urgency (priority 5 before 1), then oldest creation time.
pub fn plan_evictions(active: &[Task], incoming: usize, policy: EvictionPolicy) -> Vec<Uuid> {
    if active.len() + incoming <= policy.ceiling {
        return Vec::new();
    }

    let over_floor = active
        .len()
        .saturating_sub(policy.ceiling.saturating_sub(policy.target_floor));
    let quota = incoming.min(over_floor);

    let mut evictable: Vec<&Task> = active
        .iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .collect();
    evictable.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
    });

    evictable.into_iter().take(quota).map(|t| t.id).collect()
}

#[derive(Clone)]
pub struct CapacityGovernor {
    tasks: Arc<dyn TaskRepository>,
    policy: EvictionPolicy,
}

impl CapacityGovernor {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self {
            tasks,
            policy: EvictionPolicy::default(),
        }
    }

    pub fn with_policy(tasks: Arc<dyn TaskRepository>, policy: EvictionPolicy) -> Self {
        Self { tasks, policy }
    }

    pub fn ceiling(&self) -> usize {
        self.policy.ceiling
    }

    /// Slots left under the ceiling right now. Eviction only drains pending
    /// tasks, so this can be smaller than an incoming batch.
    pub async fn remaining_room(&self, user_id: Uuid) -> DomainResult<usize> {
        let active = self.tasks.count_active(user_id).await?;
        let active = usize::try_from(active).unwrap_or(0);
        Ok(self.policy.ceiling.saturating_sub(active))
    }

    /// Plan and apply evictions so `incoming` tasks fit. Returns the
    /// cancelled task ids.
    pub async fn make_room(&self, user_id: Uuid, incoming: usize) -> DomainResult<Vec<Uuid>> {
        let active = self.tasks.list_active(user_id).await?;
        let evicted = plan_evictions(&active, incoming, self.policy);

        if !evicted.is_empty() {
            info!(%user_id, count = evicted.len(), "Evicting pending tasks to make room");
            self.tasks.cancel_many(&evicted).await?;
        }
        Ok(evicted)
    }
}
