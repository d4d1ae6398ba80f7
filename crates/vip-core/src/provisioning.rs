//! ============================================================================
//! Provisioning Workflow - Fraud check, then credential + ledger writes
//! ============================================================================
//! One grant, strictly in order:
//! 1. fraud screening (fraud -> write `fraud_logs`, stop)
//! 2. generate credentials
//! 3. `vip_credentials`  4. `subscriptions`  5. `orders`
//! 6. `vip_access_logs`  7. `user_activity`
//!
//! The store is not transactional. Writes 3-7 are tracked, and when one of
//! them fails the documents already written for this grant are deleted in
//! reverse order before the error outcome is returned.
//! ============================================================================

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::catalog::Product;
use crate::credentials::generate_credentials;
use crate::error::StoreResult;
use crate::fraud::FraudScreener;
use crate::store::{create_record, Collection, DocumentStore};
use crate::types::{
    now_timestamp, FraudLogRecord, GrantOutcome, OrderRecord, OrderStatus, SubscriptionRecord,
    SubscriptionStatus, User, UserActivityRecord, VipAccessLogRecord, VipCredentialRecord,
    VipCredentials, FRAUD_REASON,
};

/// Documents written so far by one grant, for compensation
struct WriteLog<'a> {
    store: &'a dyn DocumentStore,
    written: Vec<(Collection, String)>,
}

impl<'a> WriteLog<'a> {
    fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            written: Vec::new(),
        }
    }

    async fn create<T: Serialize + Sync>(&mut self, collection: Collection, record: &T) -> StoreResult<()> {
        let document = create_record(self.store, collection, record).await?;
        self.written.push((collection, document.id));
        Ok(())
    }

    /// Best-effort undo; a failed delete is logged and skipped
    async fn compensate(self) {
        if self.written.is_empty() {
            return;
        }

        let total = self.written.len();
        let mut undone = 0;
        for (collection, id) in self.written.into_iter().rev() {
            match self.store.delete_document(collection, &id).await {
                Ok(()) => undone += 1,
                Err(e) => warn!(
                    "Compensation failed for document {} in {}: {} - left for manual cleanup",
                    id, collection, e
                ),
            }
        }

        warn!("Rolled back {}/{} writes of failed grant", undone, total);
    }
}

/// Runs grants against one document store
pub struct Provisioner {
    store: Arc<dyn DocumentStore>,
    screener: FraudScreener,
}

impl Provisioner {
    /// Provisioner with the default fraud rules
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let screener = FraudScreener::new(store.clone());
        Self { store, screener }
    }

    pub fn with_screener(store: Arc<dyn DocumentStore>, screener: FraudScreener) -> Self {
        Self { store, screener }
    }

    /// Attempt one grant. Never fails: store errors become
    /// `GrantOutcome::Error` after compensation.
    pub async fn grant_access(&self, user: &User, product: &Product) -> GrantOutcome {
        match self.try_grant(user, product).await {
            Ok(outcome) => {
                info!(
                    "Grant for user {} on product {}: {}",
                    user.id,
                    product.id,
                    outcome.status()
                );
                outcome
            }
            Err(e) => {
                error!(
                    "Grant for user {} on product {} failed: {}",
                    user.id, product.id, e
                );
                GrantOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn try_grant(&self, user: &User, product: &Product) -> StoreResult<GrantOutcome> {
        let verdict = self.screener.screen(user).await?;
        if verdict.is_fraud() {
            let log = FraudLogRecord {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
                reason: FRAUD_REASON.to_string(),
                created_at: now_timestamp(),
            };
            create_record(self.store.as_ref(), Collection::FraudLogs, &log).await?;
            return Ok(GrantOutcome::fraud());
        }

        let credentials = generate_credentials();
        let mut writes = WriteLog::new(self.store.as_ref());

        match Self::provision(&mut writes, user, product, &credentials).await {
            Ok(()) => Ok(credentials.into()),
            Err(e) => {
                writes.compensate().await;
                Err(e)
            }
        }
    }

    async fn provision(
        writes: &mut WriteLog<'_>,
        user: &User,
        product: &Product,
        credentials: &VipCredentials,
    ) -> StoreResult<()> {
        writes
            .create(
                Collection::VipCredentials,
                &VipCredentialRecord {
                    user_id: user.id.clone(),
                    product_id: product.id.clone(),
                    username: credentials.username.clone(),
                    password: credentials.password.clone(),
                    created_at: now_timestamp(),
                },
            )
            .await?;

        writes
            .create(
                Collection::Subscriptions,
                &SubscriptionRecord {
                    user_id: user.id.clone(),
                    product_id: product.id.clone(),
                    price: product.price_value(),
                    billing_interval: product.billing_interval_or_default().to_string(),
                    status: SubscriptionStatus::Active,
                    created_at: now_timestamp(),
                },
            )
            .await?;

        writes
            .create(
                Collection::Orders,
                &OrderRecord {
                    user_id: user.id.clone(),
                    product_id: product.id.clone(),
                    price: product.price_value(),
                    billing_interval: product.billing_interval_or_default().to_string(),
                    status: OrderStatus::Paid,
                    created_at: now_timestamp(),
                },
            )
            .await?;

        writes
            .create(
                Collection::VipAccessLogs,
                &VipAccessLogRecord {
                    user_id: user.id.clone(),
                    product_id: product.id.clone(),
                    username: credentials.username.clone(),
                    access_time: now_timestamp(),
                },
            )
            .await?;

        writes
            .create(
                Collection::UserActivity,
                &UserActivityRecord {
                    user_id: user.id.clone(),
                    activity: format!("Accessed product {}", product.name),
                    timestamp: now_timestamp(),
                },
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;

    async fn count(store: &LocalStore, collection: Collection) -> u64 {
        store.list_documents(collection, &[]).await.unwrap().total
    }

    #[tokio::test]
    async fn test_success_writes_one_record_per_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path().join("store.redb")).unwrap());
        let provisioner = Provisioner::new(store.clone());

        let user = User::new("u1", "Alice", Some("a@b.com"));
        let product = Product::new("p1", "Course A").with_price("19.99");

        let outcome = provisioner.grant_access(&user, &product).await;
        assert!(outcome.is_success(), "unexpected outcome {:?}", outcome);

        for collection in [
            Collection::VipCredentials,
            Collection::Subscriptions,
            Collection::Orders,
            Collection::VipAccessLogs,
            Collection::UserActivity,
        ] {
            assert_eq!(count(&store, collection).await, 1, "{}", collection);
        }
        assert_eq!(count(&store, Collection::FraudLogs).await, 0);

        let activity = store
            .list_documents(Collection::UserActivity, &[])
            .await
            .unwrap();
        assert_eq!(
            activity.documents[0].get_str("activity"),
            Some("Accessed product Course A")
        );
    }

    #[tokio::test]
    async fn test_missing_email_writes_only_fraud_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path().join("store.redb")).unwrap());
        let provisioner = Provisioner::new(store.clone());

        let outcome = provisioner
            .grant_access(&User::new("u1", "NoMail", None), &Product::new("p1", "Course A"))
            .await;
        assert_eq!(outcome, GrantOutcome::fraud());

        assert_eq!(count(&store, Collection::FraudLogs).await, 1);
        assert_eq!(count(&store, Collection::VipCredentials).await, 0);
        assert_eq!(count(&store, Collection::Subscriptions).await, 0);

        let log = &store
            .list_documents(Collection::FraudLogs, &[])
            .await
            .unwrap()
            .documents[0];
        assert_eq!(log.get_str("reason"), Some("Fraud detected"));
        assert_eq!(log.get_str("user_id"), Some("u1"));
        assert_eq!(log.get_str("product_id"), Some("p1"));
    }
}
