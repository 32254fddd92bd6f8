//! Notification texts sent to walk parties

use walksched_notify::Notification;
use walksched_util::WalkId;

pub const WALK_STARTED_TYPE: &str = "walk_started";
pub const WALK_EXPIRED_TYPE: &str = "walk_expired";

pub fn walk_started(walk_id: &WalkId) -> Notification {
    Notification::new(
        "Your walk is starting",
        "It's time for your walk. Head to your meeting point!",
    )
    .with_data("type", WALK_STARTED_TYPE)
    .with_data("walk_id", walk_id.as_str())
}

pub fn walk_expired(walk_id: &WalkId) -> Notification {
    Notification::new(
        "Walk expired",
        "Your walk wasn't started in time and has expired.",
    )
    .with_data("type", WALK_EXPIRED_TYPE)
    .with_data("walk_id", walk_id.as_str())
}
