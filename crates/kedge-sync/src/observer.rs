use std::collections::VecDeque;
use std::sync::Arc;

use kedge_core::{Ledger, LedgerError, StoreError, TransactionModel, TransactionStore};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::processor::TransactionProcessor;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// A transiently-failed transaction waiting for another attempt.
struct PendingRetry {
    transaction: TransactionModel,
    attempts: u32,
}

/// Polls the ledger for anchoring transactions, persists them, and drives
/// the transaction processor in `transaction_number` order.
///
/// Fork handling: when a read reports that our last known transaction is no
/// longer on the canonical chain, the observer walks the exponentially
/// spaced transaction list through the ledger to find the newest still-valid
/// transaction and drops everything later from the store.
pub struct Observer {
    ledger: Arc<dyn Ledger>,
    transaction_store: Arc<dyn TransactionStore>,
    processor: Arc<TransactionProcessor>,
    config: SyncConfig,
    retries: Mutex<VecDeque<PendingRetry>>,
}

impl Observer {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        transaction_store: Arc<dyn TransactionStore>,
        processor: Arc<TransactionProcessor>,
        config: SyncConfig,
    ) -> Self {
        Self { ledger, transaction_store, processor, config, retries: Mutex::new(VecDeque::new()) }
    }

    /// Run until `shutdown` flips to `true`. Cancellation lands between
    /// transactions, never inside one.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            let more = match self.poll_once().await {
                Ok(more) => more,
                Err(err) => {
                    warn!(error = %err, "observer poll failed; backing off");
                    false
                }
            };
            if more {
                // Keep draining while the ledger has more pages for us.
                continue;
            }
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep(self.config.polling_interval) => {}
            }
        }
    }

    /// One poll cycle: retry what is due, read the next page of
    /// transactions, process them in order. Returns whether the ledger
    /// reported more pages.
    pub async fn poll_once(&self) -> Result<bool, ObserverError> {
        self.drain_retries().await;

        let last = self.transaction_store.get_last_transaction().await?;
        let read = match self
            .ledger
            .read(
                last.as_ref().map(|tx| tx.transaction_number),
                last.as_ref().map(|tx| tx.transaction_time_hash.as_str()),
            )
            .await
        {
            Ok(read) => read,
            // The ledger no longer recognises our cursor: a fork. Roll the
            // store back to the newest transaction still on-chain and let
            // the next poll re-read from there.
            Err(LedgerError::Request(reason)) => {
                warn!(reason = %reason, "ledger rejected our cursor; assuming fork");
                self.recover_from_fork().await?;
                return Ok(true);
            }
            Err(err @ LedgerError::NotReachable(_)) => return Err(err.into()),
        };

        let mut transactions = read.transactions;
        transactions.sort_by_key(|tx| tx.transaction_number);
        for transaction in transactions {
            self.transaction_store.add_transaction(transaction.clone()).await?;
            let handled = self.processor.process_transaction(&transaction).await;
            if !handled {
                self.queue_retry(transaction, 0).await;
            }
        }

        Ok(read.more_transactions)
    }

    async fn drain_retries(&self) {
        let mut due: VecDeque<PendingRetry> = {
            let mut retries = self.retries.lock().await;
            std::mem::take(&mut *retries)
        };
        while let Some(pending) = due.pop_front() {
            let handled = self.processor.process_transaction(&pending.transaction).await;
            if handled {
                continue;
            }
            let attempts = pending.attempts + 1;
            if attempts >= self.config.max_retry_attempts {
                warn!(
                    transaction_number = pending.transaction.transaction_number,
                    attempts,
                    "giving up on transaction until restart"
                );
            } else {
                self.queue_retry(pending.transaction, attempts).await;
            }
        }
    }

    async fn queue_retry(&self, transaction: TransactionModel, attempts: u32) {
        self.retries
            .lock()
            .await
            .push_back(PendingRetry { transaction, attempts });
    }

    async fn recover_from_fork(&self) -> Result<(), ObserverError> {
        let spaced = self
            .transaction_store
            .get_exponentially_spaced_transactions()
            .await?;
        let first_valid = self.ledger.get_first_valid_transaction(&spaced).await?;
        match first_valid {
            Some(transaction) => {
                info!(
                    transaction_number = transaction.transaction_number,
                    "fork point located; dropping later transactions"
                );
                self.transaction_store
                    .remove_transactions_later_than(Some(transaction.transaction_number))
                    .await?;
            }
            None => {
                warn!("no stored transaction remains on-chain; resetting transaction store");
                self.transaction_store.remove_transactions_later_than(None).await?;
            }
        }
        Ok(())
    }
}
