//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input before any repository call.
//! - Keep routing callers decoupled from storage details.

pub mod validation;
pub mod voter_service;
