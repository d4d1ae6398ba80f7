//! ============================================================================
//! Batch Driver - Grants every (user, product) pair, one at a time
//! ============================================================================
//! Users come from the `users` collection (default listing, no paging),
//! products from the catalog. Order: users outer, products inner. A failed
//! grant is counted and the batch moves on; a failed user listing aborts.
//! ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::catalog::Product;
use crate::provisioning::Provisioner;
use crate::store::{Collection, DocumentStore};
use crate::types::{GrantOutcome, User};

/// Outcome counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub granted: usize,
    pub fraud: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &GrantOutcome) {
        match outcome {
            GrantOutcome::Success { .. } => self.granted += 1,
            GrantOutcome::Fraud { .. } => self.fraud += 1,
            GrantOutcome::Error { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.granted + self.fraud + self.failed
    }
}

pub struct BatchDriver {
    store: Arc<dyn DocumentStore>,
    provisioner: Provisioner,
}

impl BatchDriver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let provisioner = Provisioner::new(store.clone());
        Self { store, provisioner }
    }

    pub fn with_provisioner(store: Arc<dyn DocumentStore>, provisioner: Provisioner) -> Self {
        Self { store, provisioner }
    }

    /// Load every user from the store
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = self
            .store
            .list_documents(Collection::Users, &[])
            .await
            .context("Failed to list users")?;

        Ok(users.documents.iter().map(User::from_document).collect())
    }

    /// Grant every product to every user, calling `on_grant` after each
    /// grant completes
    pub async fn run<F>(&self, products: &[Product], mut on_grant: F) -> Result<BatchReport>
    where
        F: FnMut(&User, &Product, &GrantOutcome),
    {
        let users = self.list_users().await?;
        info!(
            "Starting batch: {} users x {} products",
            users.len(),
            products.len()
        );

        let mut report = BatchReport::default();
        for user in &users {
            for product in products {
                let outcome = self.provisioner.grant_access(user, product).await;
                report.record(&outcome);
                on_grant(user, product, &outcome);
            }
        }

        info!(
            "Batch complete: {} granted, {} fraud, {} failed",
            report.granted, report.fraud, report.failed
        );
        Ok(report)
    }
}
