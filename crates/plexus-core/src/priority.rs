//! Named priority tiers.
//!
//! Priority is an open `i32` domain: any value is legal and ordering is purely
//! numeric. The tiers below are reference points used by the drain strategies
//! of [`PriorityQueue`](crate::PriorityQueue).

/// Priority of a queued task. Higher values run first.
pub type Priority = i32;

/// Urgent work. `execute_high` and `execute_highest` drain everything at or
/// above this tier.
pub const HIGH: Priority = 100;

/// Default tier for ordinary work, including channel fan-out.
pub const MEDIUM: Priority = 50;

/// Background work.
pub const LOW: Priority = 10;
