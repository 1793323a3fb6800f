//! Finance entity adapters
//!
//! Transactions and recurring bills. Amounts, dates, categories and IDs stay
//! in plaintext for querying; free text that can identify the user does not.

use crate::config::settings::DEFAULT_REFERENCE_MIN_LENGTH;
use crate::engine::FieldAllowlist;

use super::EntityAdapter;

/// A single bank or card transaction
///
/// Short reference codes are kept in plaintext so they remain usable for
/// matching; longer ones may be account or card numbers and are encrypted.
#[derive(Debug, Clone)]
pub struct TransactionAdapter {
    allowlist: FieldAllowlist,
}

impl TransactionAdapter {
    /// Create an adapter with a custom reference-number threshold
    pub fn new(reference_min_length: usize) -> Self {
        Self {
            allowlist: FieldAllowlist::new()
                .text("description")
                .text("account")
                .text("notes")
                .text_min_length("referenceNumber", reference_min_length),
        }
    }
}

impl Default for TransactionAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_MIN_LENGTH)
    }
}

impl EntityAdapter for TransactionAdapter {
    fn entity_type(&self) -> &'static str {
        "transaction"
    }

    fn allowlist(&self) -> &FieldAllowlist {
        &self.allowlist
    }

    fn date_fields(&self) -> &'static [&'static str] {
        &["date", "createdAt", "updatedAt"]
    }
}

/// A recurring bill or subscription with its payment history
#[derive(Debug, Clone)]
pub struct RecurringTransactionAdapter {
    allowlist: FieldAllowlist,
}

impl RecurringTransactionAdapter {
    pub fn new() -> Self {
        Self {
            allowlist: FieldAllowlist::new()
                .text("name")
                .text("description")
                .nested("paymentHistory", FieldAllowlist::new().text("notes")),
        }
    }
}

impl Default for RecurringTransactionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAdapter for RecurringTransactionAdapter {
    fn entity_type(&self) -> &'static str {
        "recurring_transaction"
    }

    fn allowlist(&self) -> &FieldAllowlist {
        &self.allowlist
    }

    fn date_fields(&self) -> &'static [&'static str] {
        &[
            "startDate",
            "endDate",
            "nextDueDate",
            "createdAt",
            "updatedAt",
            "paymentHistory.date",
        ]
    }
}
