//! Explicit settlement of tuition obligations.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::errors::{LedgerError, Result};
use crate::ledger::Snapshot;

/// Records tuition payments against generated obligations.
pub struct PaymentService;

impl PaymentService {
    /// Marks an open obligation as paid on `date`.
    ///
    /// Paid obligations are final; paying one again is rejected so the original
    /// payment date is never overwritten.
    pub fn mark_paid(snapshot: &mut Snapshot, id: &str, date: NaiveDate) -> Result<()> {
        let payment = snapshot
            .payment_mut(id)
            .ok_or_else(|| LedgerError::not_found("Payment", id))?;
        if payment.is_paid() {
            warn!(payment = %id, "rejected repeated payment");
            return Err(LedgerError::InvalidOperation(format!(
                "payment `{id}` is already paid"
            )));
        }
        payment.mark_paid(date);
        info!(payment = %id, %date, "payment recorded");
        Ok(())
    }
}
