//! Domain model for voters and their poll participation history.
//!
//! # Responsibility
//! - Define the persisted voter/poll-record shapes shared by every backend.
//! - Keep identity rules (voter id, per-voter poll id) explicit in types.
//!
//! # Invariants
//! - A voter is identified by an externally supplied positive id.
//! - Poll records are owned by exactly one voter and keyed by poll id.

pub mod voter;
