use kedge_core::{ProtocolError, ValueTimeLockModel, ValueTimeLockVerifier};

/// Value-time-lock entitlement check.
///
/// Without a lock a writer gets `max_operations_without_lock` per
/// transaction. A lock raises that to `amount_locked / normalized_fee`,
/// provided the lock belongs to the writer and spans the transaction time.
#[derive(Debug, Clone)]
pub struct LockAmountVerifier {
    pub max_operations_without_lock: u64,
}

impl ValueTimeLockVerifier for LockAmountVerifier {
    fn verify(
        &self,
        lock: Option<&ValueTimeLockModel>,
        number_of_operations: u64,
        transaction_time: u64,
        writer: &str,
    ) -> Result<(), ProtocolError> {
        let Some(lock) = lock else {
            if number_of_operations > self.max_operations_without_lock {
                return Err(ProtocolError::ValueTimeLockInvalid(format!(
                    "{number_of_operations} operations anchored without a lock (limit {})",
                    self.max_operations_without_lock
                )));
            }
            return Ok(());
        };

        if lock.owner != writer {
            return Err(ProtocolError::ValueTimeLockInvalid(
                "lock owner does not match transaction writer".to_string(),
            ));
        }
        if transaction_time < lock.lock_transaction_time
            || transaction_time >= lock.unlock_transaction_time
        {
            return Err(ProtocolError::ValueTimeLockInvalid(
                "lock does not span the transaction time".to_string(),
            ));
        }
        let allowed = lock.amount_locked / lock.normalized_fee.max(1);
        if number_of_operations > allowed {
            return Err(ProtocolError::ValueTimeLockInvalid(format!(
                "{number_of_operations} operations exceed the lock entitlement of {allowed}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(owner: &str, amount: u64) -> ValueTimeLockModel {
        ValueTimeLockModel {
            identifier: "lock-1".to_string(),
            amount_locked: amount,
            lock_transaction_time: 100,
            unlock_transaction_time: 200,
            normalized_fee: 10,
            owner: owner.to_string(),
        }
    }

    #[test]
    fn no_lock_uses_free_allowance() {
        let verifier = LockAmountVerifier { max_operations_without_lock: 100 };
        assert!(verifier.verify(None, 100, 0, "w").is_ok());
        assert!(verifier.verify(None, 101, 0, "w").is_err());
    }

    #[test]
    fn lock_extends_allowance_for_its_owner_only() {
        let verifier = LockAmountVerifier { max_operations_without_lock: 100 };
        let lock = lock("writer", 5_000);
        assert!(verifier.verify(Some(&lock), 500, 150, "writer").is_ok());
        assert!(verifier.verify(Some(&lock), 501, 150, "writer").is_err());
        assert!(verifier.verify(Some(&lock), 10, 150, "other").is_err());
    }

    #[test]
    fn expired_lock_is_rejected() {
        let verifier = LockAmountVerifier { max_operations_without_lock: 100 };
        let lock = lock("writer", 5_000);
        assert!(verifier.verify(Some(&lock), 10, 99, "writer").is_err());
        assert!(verifier.verify(Some(&lock), 10, 200, "writer").is_err());
    }
}
