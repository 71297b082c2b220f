//! Backup-and-restore transactions over named graphs, enforcing a single
//! open transaction per store.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use semem_core::error::{Error, Result};

use crate::cache::CacheLayer;
use crate::client::SparqlClient;

/// State of an open backup-and-restore transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// `begin()` has copied `main` to `backup`; updates may be applied to `main`.
    Open,
    /// `commit()` has dropped the backup graph.
    Committed,
    /// `rollback()` has restored `main` from the backup graph.
    RolledBack,
}

/// A single open transaction's bookkeeping.
#[derive(Debug, Clone)]
struct Transaction {
    main_graph_iri: String,
    backup_graph_iri: String,
    state: TransactionState,
    start_time: DateTime<Utc>,
}

/// Enforces at most one open transaction per store instance, and the
/// `begin`/`commit`/`rollback` backup-graph protocol.
pub struct TransactionManager {
    current: Mutex<Option<Transaction>>,
}

impl TransactionManager {
    /// Construct a manager with no open transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Begin a transaction: `COPY <main> TO <backup>`, then mark `Open`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionBusy`] if a transaction is already open
    /// in this process, [`Error::StaleBackup`] if the backup graph already
    /// exists on the endpoint (e.g. left behind by a crash), or the SPARQL
    /// client's error if the `COPY` fails.
    pub async fn begin(&self, client: &SparqlClient, main_graph_iri: &str, backup_graph_iri: &str) -> Result<()> {
        {
            let guard = self.current.lock();
            if guard.is_some() {
                return Err(Error::TransactionBusy);
            }
        }

        if Self::backup_graph_exists(client, backup_graph_iri).await? {
            return Err(Error::StaleBackup(backup_graph_iri.to_string()));
        }

        client
            .execute_update(&format!("COPY <{main_graph_iri}> TO <{backup_graph_iri}>"))
            .await?;

        *self.current.lock() = Some(Transaction {
            main_graph_iri: main_graph_iri.to_string(),
            backup_graph_iri: backup_graph_iri.to_string(),
            state: TransactionState::Open,
            start_time: Utc::now(),
        });
        Ok(())
    }

    /// Probe the endpoint for a pre-existing backup graph via
    /// `ASK { GRAPH <backup> { ?s ?p ?o } }`.
    async fn backup_graph_exists(client: &SparqlClient, backup_graph_iri: &str) -> Result<bool> {
        let body = client
            .execute_query(&format!("ASK {{ GRAPH <{backup_graph_iri}> {{ ?s ?p ?o }} }}"))
            .await?;
        let parsed: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;
        Ok(parsed["boolean"].as_bool().unwrap_or(false))
    }

    /// Commit the open transaction: `DROP GRAPH <backup>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionBusy`] if no transaction is open (reused
    /// here for "no transaction to act on"), or the client's error if the
    /// `DROP` fails.
    pub async fn commit(&self, client: &SparqlClient) -> Result<()> {
        let backup = {
            let guard = self.current.lock();
            match &*guard {
                Some(tx) if tx.state == TransactionState::Open => tx.backup_graph_iri.clone(),
                _ => return Err(Error::TransactionBusy),
            }
        };

        client.execute_update(&format!("DROP GRAPH <{backup}>")).await?;

        *self.current.lock() = None;
        Ok(())
    }

    /// Roll back the open transaction: `MOVE <backup> TO <main>`, then
    /// invalidate `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionBusy`] if no transaction is open, or the
    /// client's error if the `MOVE` fails.
    pub async fn rollback(&self, client: &SparqlClient, cache: &CacheLayer) -> Result<()> {
        let (main, backup) = {
            let guard = self.current.lock();
            match &*guard {
                Some(tx) if tx.state == TransactionState::Open => (tx.main_graph_iri.clone(), tx.backup_graph_iri.clone()),
                _ => return Err(Error::TransactionBusy),
            }
        };

        client
            .execute_update(&format!("MOVE <{backup}> TO <{main}>"))
            .await?;
        cache.invalidate_all();

        *self.current.lock() = None;
        Ok(())
    }

    /// Whether a transaction is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.current.lock().as_ref().map(|tx| &tx.state),
            Some(TransactionState::Open)
        )
    }

    /// The start time of the currently open transaction, if any.
    #[must_use]
    pub fn open_since(&self) -> Option<DateTime<Utc>> {
        self.current.lock().as_ref().and_then(|tx| {
            (tx.state == TransactionState::Open).then_some(tx.start_time)
        })
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_has_no_open_transaction() {
        let manager = TransactionManager::new();
        assert!(!manager.is_open());
        assert!(manager.open_since().is_none());
    }
}
