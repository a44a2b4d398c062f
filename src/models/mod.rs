mod subscription;
mod transaction;

pub use subscription::{NewSubscriptionItem, Subscription, SubscriptionItem, SubscriptionUpdate};
pub use transaction::{BillingTransaction, NewTransactionPayment, TransactionPayment, TransactionUpdate};

/// Outcome of an upsert at the mapper/store boundary.
///
/// `Ignored` means the inbound payload carried no usable identifier - the
/// event is acknowledged but nothing was written. Storage failures are a
/// separate `Err` path, so callers can tell "nothing to do" apart from
/// "something went wrong".
#[derive(Debug)]
pub enum UpsertOutcome<T> {
    Applied(T),
    Ignored,
}

impl<T> UpsertOutcome<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, UpsertOutcome::Ignored)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            UpsertOutcome::Applied(row) => Some(row),
            UpsertOutcome::Ignored => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UpsertOutcome<U> {
        match self {
            UpsertOutcome::Applied(row) => UpsertOutcome::Applied(f(row)),
            UpsertOutcome::Ignored => UpsertOutcome::Ignored,
        }
    }
}
