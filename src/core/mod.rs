//! Billing engine, command services and the host that persists their results.

pub mod billing_manager;
pub mod engine;
pub mod obligations;
pub mod reconcile;
pub mod services;
pub mod utils;

pub use billing_manager::{BillingManager, Command, CommitReport};
pub use engine::{evaluate, Evaluation};
pub use obligations::ObligationGenerator;
pub use reconcile::StatusReconciler;
