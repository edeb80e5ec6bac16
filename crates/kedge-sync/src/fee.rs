use kedge_core::{FeeManager, ProtocolError};

/// Flat per-operation fee schedule: a transaction must pay at least
/// `fee_per_operation` for every operation its anchor string declares.
#[derive(Debug, Clone)]
pub struct PerOperationFeeManager {
    pub fee_per_operation: u64,
}

impl FeeManager for PerOperationFeeManager {
    fn verify(
        &self,
        number_of_operations: u64,
        fee_paid: u64,
        _transaction_time: u64,
    ) -> Result<(), ProtocolError> {
        let required = number_of_operations.saturating_mul(self.fee_per_operation);
        if fee_paid < required {
            return Err(ProtocolError::TransactionFeeBelowRequired { fee_paid, required });
        }
        Ok(())
    }
}
