//! Metrics for session, invite and membership activity
//!
//! Counters go through the `metrics` facade; installing a recorder is left
//! to the embedding binary.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_ARCHIVED: &str = "session.archived";
pub const INVITE_CREATED: &str = "invite.created";
pub const INVITE_REDEEMED: &str = "invite.redeemed";
pub const INVITE_REJECTED: &str = "invite.rejected";
pub const MEMBER_REMOVED: &str = "member.removed";
pub const CHARACTER_SELECTED: &str = "character.selected";
pub const HTTP_REQUEST_DURATION: &str = "http.request.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(SESSION_CREATED, "Number of sessions created");
    describe_counter!(SESSION_ARCHIVED, "Number of sessions archived");
    describe_counter!(INVITE_CREATED, "Number of invite codes minted");
    describe_counter!(INVITE_REDEEMED, "Successful joins by invite code");
    describe_counter!(INVITE_REJECTED, "Joins refused because the invite was expired or used up");
    describe_counter!(MEMBER_REMOVED, "Members removed or leaving a session");
    describe_counter!(CHARACTER_SELECTED, "Character selections, new or replaced");
    describe_histogram!(HTTP_REQUEST_DURATION, "HTTP handler duration in milliseconds");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    route: &'static str,
    start: Instant,
}

impl Timer {
    /// Start timing an operation labelled with `route`
    pub fn new(name: &'static str, route: &'static str) -> Self {
        Self {
            name,
            route,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let elapsed = self.start.elapsed();
        histogram!(self.name, "route" => self.route).record(elapsed.as_secs_f64() * 1000.0);
    }
}
