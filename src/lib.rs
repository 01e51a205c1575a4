#![doc(test(attr(deny(warnings))))]

//! Tuition Core tracks monthly tuition obligations for a tutoring practice,
//! escalates overdue payments and expenses, and aggregates the financial
//! figures shown on its dashboards.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Tuition Core tracing initialized.");
    });
}
