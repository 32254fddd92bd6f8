//! State guard
//!
//! Jobs are scheduled minutes ahead and the walk document is owned by other
//! writers in the meantime, so every job re-reads the walk right before it
//! acts and does nothing unless the walk is still in the state it expects.

use std::fmt;
use walksched_api::WalkStatus;
use walksched_store::{Store, StoreResult, WalkRecord, collections};
use walksched_util::WalkId;

/// Why a fired job left the store untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WalkNotFound,
    NotAccepted(WalkStatus),
    AlreadyActivated,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WalkNotFound => f.write_str("walk not found"),
            SkipReason::NotAccepted(status) => write!(f, "walk status is {}", status),
            SkipReason::AlreadyActivated => f.write_str("walk already activated"),
        }
    }
}

/// Result of a guard check
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    Met(WalkRecord),
    NotMet(SkipReason),
}

/// Activation runs only for an accepted walk it has not already activated
pub fn activation_precondition(walk: Option<&WalkRecord>) -> Result<(), SkipReason> {
    let walk = walk.ok_or(SkipReason::WalkNotFound)?;
    if walk.status != WalkStatus::Accepted {
        return Err(SkipReason::NotAccepted(walk.status));
    }
    if walk.activation_applied {
        return Err(SkipReason::AlreadyActivated);
    }
    Ok(())
}

/// Expiry runs only for an accepted walk that was never activated.
///
/// A walk whose activation landed but that nobody has started yet still
/// reads `accepted`; the activation marker keeps it from being expired.
pub fn timeout_precondition(walk: Option<&WalkRecord>) -> Result<(), SkipReason> {
    activation_precondition(walk)
}

/// Re-reads walks from the store and evaluates job preconditions
pub struct StateGuard<'a> {
    store: &'a dyn Store,
}

impl<'a> StateGuard<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn load(&self, walk_id: &WalkId) -> StoreResult<Option<WalkRecord>> {
        self.store
            .get(collections::WALKS, walk_id.as_str())
            .await?
            .map(|doc| WalkRecord::from_document(walk_id, &doc))
            .transpose()
    }

    pub async fn check_activation(&self, walk_id: &WalkId) -> StoreResult<Precondition> {
        let walk = self.load(walk_id).await?;
        Ok(evaluate(walk, activation_precondition))
    }

    pub async fn check_timeout(&self, walk_id: &WalkId) -> StoreResult<Precondition> {
        let walk = self.load(walk_id).await?;
        Ok(evaluate(walk, timeout_precondition))
    }
}

fn evaluate(
    walk: Option<WalkRecord>,
    check: fn(Option<&WalkRecord>) -> Result<(), SkipReason>,
) -> Precondition {
    match check(walk.as_ref()) {
        Ok(()) => match walk {
            Some(walk) => Precondition::Met(walk),
            None => Precondition::NotMet(SkipReason::WalkNotFound),
        },
        Err(reason) => Precondition::NotMet(reason),
    }
}
