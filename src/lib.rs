//! Clickgate - merchant-side callback server for the Click payment gateway
//!
//! This library implements the two-phase (PREPARE/COMPLETE) webhook protocol
//! the gateway drives against a merchant server: signature verification,
//! callback validation, and race-safe payment state transitions, plus the
//! outbound merchant API client used for status reconciliation and reversals.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod sync;
