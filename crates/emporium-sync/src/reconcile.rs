//! # Reconciliation
//!
//! One pass compares the full record sets of two stores, kind by kind, and
//! copies whatever is needed to make them equal.
//!
//! ## Per-Record Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reconciliation Strategy                              │
//! │                                                                         │
//! │  local only              → PUSH   (remote.upsert)                       │
//! │  remote only             → PULL   (local.upsert)                        │
//! │  both, identical         → nothing                                      │
//! │  both, different         → CONFLICT, last writer wins:                  │
//! │      local.revision >  remote.revision → PUSH                           │
//! │      local.revision <= remote.revision → PULL  (tie goes to remote)     │
//! │                                                                         │
//! │  Upserts keep the record verbatim, revision included, so applying the  │
//! │  same plan twice converges to the same state.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Kinds run in [`EntityKind::SYNC_ORDER`] so parents land before the
//! records pointing at them. A failure stops the pass; kinds already
//! reconciled stay reconciled.
//!
//! Deletions are not tracked: a record removed on one side is restored
//! from the other by the next pass.

use emporium_core::{Category, Customer, EntityKind, Product, Sale, SaleItem, SyncCounts};
use emporium_db::{bounded, DbError, Store, Stored};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// What one kind needs to converge.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<E> {
    pub push: Vec<E>,
    pub pull: Vec<E>,
    pub conflicts: u64,
}

impl<E> Plan<E> {
    pub fn counts(&self) -> SyncCounts {
        SyncCounts {
            pushed: self.push.len() as u64,
            pulled: self.pull.len() as u64,
            conflicts: self.conflicts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.push.is_empty() && self.pull.is_empty()
    }
}

/// Decides, without I/O, which records move in which direction.
pub fn plan<E: Stored>(local: Vec<E>, remote: Vec<E>) -> Plan<E> {
    let mut local_by_id: HashMap<String, E> = local
        .into_iter()
        .map(|e| (e.id().to_string(), e))
        .collect();

    let mut plan = Plan {
        push: Vec::new(),
        pull: Vec::new(),
        conflicts: 0,
    };

    for theirs in remote {
        match local_by_id.remove(theirs.id()) {
            None => plan.pull.push(theirs),
            Some(ours) if ours == theirs => {}
            Some(ours) => {
                plan.conflicts += 1;
                debug!(
                    kind = %E::KIND,
                    id = %ours.id(),
                    local_revision = ours.revision(),
                    remote_revision = theirs.revision(),
                    "Conflicting versions"
                );
                if ours.revision() > theirs.revision() {
                    plan.push.push(ours);
                } else {
                    plan.pull.push(theirs);
                }
            }
        }
    }

    let mut local_only: Vec<E> = local_by_id.into_values().collect();
    local_only.sort_by(|a, b| a.id().cmp(b.id()));
    plan.push.extend(local_only);

    plan
}

/// Runs every kind in order, summing the counts.
pub async fn reconcile_all(
    local: &dyn Store,
    remote: &dyn Store,
    op_timeout: Duration,
) -> SyncResult<SyncCounts> {
    let mut total = SyncCounts::default();

    for kind in EntityKind::SYNC_ORDER {
        let counts = match kind {
            EntityKind::Category => reconcile_kind::<Category>(local, remote, op_timeout).await?,
            EntityKind::Customer => reconcile_kind::<Customer>(local, remote, op_timeout).await?,
            EntityKind::Product => reconcile_kind::<Product>(local, remote, op_timeout).await?,
            EntityKind::Sale => reconcile_kind::<Sale>(local, remote, op_timeout).await?,
            EntityKind::SaleItem => reconcile_kind::<SaleItem>(local, remote, op_timeout).await?,
        };
        total += counts;
    }

    Ok(total)
}

/// Reconciles one kind between the two stores.
pub async fn reconcile_kind<E: Stored>(
    local: &dyn Store,
    remote: &dyn Store,
    op_timeout: Duration,
) -> SyncResult<SyncCounts> {
    let theirs = bounded(
        &format!("fetch remote {}", E::KIND),
        op_timeout,
        E::repository(remote).fetch_all(),
    )
    .await?;
    let ours = bounded(
        &format!("fetch local {}", E::KIND),
        op_timeout,
        E::repository(local).fetch_all(),
    )
    .await?;

    let plan = plan(ours, theirs);
    if plan.is_empty() {
        debug!(kind = %E::KIND, "Already in sync");
        return Ok(plan.counts());
    }

    for entity in &plan.push {
        apply(remote, entity, "push", op_timeout).await?;
    }
    for entity in &plan.pull {
        apply(local, entity, "pull", op_timeout).await?;
    }

    let counts = plan.counts();
    info!(
        kind = %E::KIND,
        pushed = counts.pushed,
        pulled = counts.pulled,
        conflicts = counts.conflicts,
        "Kind reconciled"
    );
    Ok(counts)
}

async fn apply<E: Stored>(
    target: &dyn Store,
    entity: &E,
    direction: &str,
    op_timeout: Duration,
) -> SyncResult<()> {
    let operation = format!("{} {} {}", direction, E::KIND, entity.id());

    bounded(&operation, op_timeout, E::repository(target).upsert(entity))
        .await
        .map_err(|err| apply_error::<E>(entity.id(), err))
}

/// Transient failures keep their class; anything else is an apply failure
/// naming the record.
fn apply_error<E: Stored>(id: &str, err: DbError) -> SyncError {
    if err.kind().is_transient() {
        return SyncError::from(err);
    }
    SyncError::ApplyFailed {
        kind: E::KIND.to_string(),
        id: id.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::{CategoryDraft, Entity};

    fn category(id: &str, name: &str, revision: i64) -> Category {
        let mut c = Category::from_draft(
            id.to_string(),
            CategoryDraft {
                name: name.to_string(),
                ..Default::default()
            },
            emporium_core::now(),
        )
        .unwrap();
        c.revision = revision;
        c
    }

    #[test]
    fn test_plan_one_sided_records() {
        let plan = plan(
            vec![category("a", "Bebidas", 1)],
            vec![category("b", "Limpeza", 1)],
        );

        assert_eq!(plan.push.len(), 1);
        assert_eq!(plan.push[0].id, "a");
        assert_eq!(plan.pull.len(), 1);
        assert_eq!(plan.pull[0].id, "b");
        assert_eq!(plan.conflicts, 0);
    }

    #[test]
    fn test_plan_higher_revision_wins() {
        let local = category("a", "Bebidas Geladas", 3);
        let mut remote = local.clone();
        remote.name = "Bebidas".into();
        remote.revision = 2;

        let plan = plan(vec![local], vec![remote]);
        assert_eq!(plan.conflicts, 1);
        assert_eq!(plan.push.len(), 1);
        assert_eq!(plan.push[0].name, "Bebidas Geladas");
        assert!(plan.pull.is_empty());
    }

    #[test]
    fn test_plan_tie_goes_to_remote() {
        let local = category("a", "Local", 2);
        let mut remote = local.clone();
        remote.name = "Remote".into();

        let plan = plan(vec![local], vec![remote]);
        assert_eq!(plan.conflicts, 1);
        assert_eq!(plan.pull.len(), 1);
        assert_eq!(plan.pull[0].name, "Remote");
    }

    #[test]
    fn test_plan_identical_records_are_left_alone() {
        let c = category("a", "Bebidas", 4);
        let plan = plan(vec![c.clone()], vec![c]);

        assert!(plan.is_empty());
        assert_eq!(plan.counts(), SyncCounts::default());
    }

    #[test]
    fn test_apply_error_classification() {
        let err = apply_error::<Category>("a", DbError::Unavailable);
        assert!(err.is_retryable());

        let err = apply_error::<Category>(
            "a",
            DbError::CheckViolation {
                message: "CHECK constraint failed".into(),
            },
        );
        assert!(matches!(err, SyncError::ApplyFailed { .. }));
        assert!(!err.is_retryable());
    }
}
