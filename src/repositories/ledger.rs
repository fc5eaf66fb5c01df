//! # Ledger Repository
//!
//! Batch transaction ingestion and incremental balance checkpoints.
//!
//! Balances are folded forward from the previous checkpoint rather than
//! recomputed from full history: each `calculate_balances` call reads the
//! store clock once, selects activity in the half-open window
//! `(last_checkpoint, T]` per organization, and appends one new checkpoint
//! row per organization in a single transaction. A window is never read
//! twice and never skipped, so no transaction is double-counted across
//! calls.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::server_time;
use crate::error::Error;
use crate::models::balance::{self, Entity as Balance};
use crate::models::organization::{self, Entity as Organization};
use crate::models::payment::{self, Entity as Payment};
use crate::models::transaction::{self, Entity as Transaction};

/// A usage record to be appended by [`LedgerRepository::add_transactions_batch`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub organization_id: i64,
    pub user_id: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub cost: f64,
    /// Defaults to USD.
    pub currency: Option<String>,
    /// Defaults to the store clock at insert time.
    pub create_time: Option<DateTime<Utc>>,
}

/// Repository for the balance/ledger accounting operations
pub struct LedgerRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LedgerRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append a batch of transactions as one atomic unit.
    ///
    /// Every record is validated before anything is written; any invalid
    /// record or store failure leaves zero rows behind. Balances are not
    /// touched here.
    pub async fn add_transactions_batch(
        &self,
        transactions: Vec<NewTransaction>,
    ) -> Result<u64, Error> {
        for (index, tx) in transactions.iter().enumerate() {
            if !tx.cost.is_finite() || tx.cost < 0.0 {
                return Err(Error::validation(format!(
                    "transaction {index}: cost must be finite and nonnegative"
                )));
            }
            if tx.prompt_tokens < 0 || tx.completion_tokens < 0 {
                return Err(Error::validation(format!(
                    "transaction {index}: token counts must be nonnegative"
                )));
            }
        }

        if transactions.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        let now = server_time(&txn).await?;

        let count = transactions.len() as u64;
        let models = transactions.into_iter().map(|tx| transaction::ActiveModel {
            organization_id: Set(tx.organization_id),
            user_id: Set(tx.user_id),
            prompt_tokens: Set(tx.prompt_tokens),
            completion_tokens: Set(tx.completion_tokens),
            cost: Set(tx.cost),
            currency: Set(tx.currency.unwrap_or_else(|| "USD".to_string())),
            create_time: Set(tx.create_time.unwrap_or(now).into()),
            ..Default::default()
        });

        Transaction::insert_many(models).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(count, "Added transaction batch");
        Ok(count)
    }

    /// Record a payment crediting an organization's balance.
    pub async fn record_payment(
        &self,
        organization_id: i64,
        amount: f64,
        currency: Option<String>,
        create_time: Option<DateTime<Utc>>,
    ) -> Result<payment::Model, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::validation(
                "payment amount must be finite and nonnegative",
            ));
        }

        Organization::find_by_id(organization_id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("organization"))?;

        let now = server_time(self.db).await?;

        let model = payment::ActiveModel {
            organization_id: Set(organization_id),
            amount: Set(amount),
            currency: Set(currency.unwrap_or_else(|| "USD".to_string())),
            create_time: Set(create_time.unwrap_or(now).into()),
            ..Default::default()
        };

        let created = model.insert(self.db).await?;
        tracing::info!(
            payment_id = created.id,
            organization_id,
            amount,
            "Recorded payment"
        );
        Ok(created)
    }

    /// Compute and append a balance checkpoint for each target organization
    /// (default: every organization in the store).
    ///
    /// One snapshot instant `T` is read from the store clock at call start
    /// and shared by every organization, so the returned balances are
    /// mutually comparable. `T` is truncated to whole seconds and backed off
    /// by one second to stay behind in-flight same-second inserts. Each
    /// organization folds activity in `(last_checkpoint, T]` onto its last
    /// balance; a checkpoint row is appended even when the window is empty.
    /// All rows commit in one transaction.
    pub async fn calculate_balances(
        &self,
        organization_ids: Option<Vec<i64>>,
    ) -> Result<Vec<(i64, f64)>, Error> {
        let txn = self.db.begin().await?;

        let targets = self.resolve_targets(&txn, organization_ids).await?;

        let now = server_time(&txn).await?;
        let snapshot: DateTimeWithTimeZone = (now.trunc_subsecs(0) - Duration::seconds(1)).into();

        let mut results = Vec::with_capacity(targets.len());
        for (organization_id, currency) in targets {
            let mut last_query = Balance::find()
                .filter(balance::Column::OrganizationId.eq(organization_id))
                .order_by_desc(balance::Column::Id);
            if txn.get_database_backend() == DatabaseBackend::Postgres {
                last_query = last_query.lock_exclusive();
            }
            let last = last_query.one(&txn).await?;

            let (last_time, last_balance) = match &last {
                Some(checkpoint) => (Some(checkpoint.timestamp), checkpoint.balance),
                None => (None, 0.0),
            };

            let mut tx_query = Transaction::find()
                .filter(transaction::Column::OrganizationId.eq(organization_id))
                .filter(transaction::Column::CreateTime.lte(snapshot));
            if let Some(last_time) = last_time {
                tx_query = tx_query.filter(transaction::Column::CreateTime.gt(last_time));
            }
            let window_transactions = tx_query.all(&txn).await?;

            let mut payment_query = Payment::find()
                .filter(payment::Column::OrganizationId.eq(organization_id))
                .filter(payment::Column::CreateTime.lte(snapshot));
            if let Some(last_time) = last_time {
                payment_query = payment_query.filter(payment::Column::CreateTime.gt(last_time));
            }
            let window_payments = payment_query.all(&txn).await?;

            let prompt_token_sum: i64 = window_transactions.iter().map(|t| t.prompt_tokens).sum();
            let response_token_sum: i64 =
                window_transactions.iter().map(|t| t.completion_tokens).sum();
            let cost_sum: f64 = window_transactions.iter().map(|t| t.cost).sum();
            let payment_sum: f64 = window_payments.iter().map(|p| p.amount).sum();

            let new_balance = last_balance - cost_sum + payment_sum;

            balance::ActiveModel {
                organization_id: Set(organization_id),
                timestamp: Set(snapshot),
                prompt_token_sum: Set(prompt_token_sum),
                response_token_sum: Set(response_token_sum),
                balance: Set(new_balance),
                currency: Set(currency),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            results.push((organization_id, new_balance));
        }

        txn.commit().await?;

        tracing::info!(
            organizations = results.len(),
            "Calculated balance checkpoints"
        );
        Ok(results)
    }

    /// Resolve the target list to (organization id, currency) pairs in input
    /// order, duplicates collapsed. An explicit id that does not exist fails
    /// the whole call with NotFound.
    async fn resolve_targets<C: ConnectionTrait>(
        &self,
        conn: &C,
        organization_ids: Option<Vec<i64>>,
    ) -> Result<Vec<(i64, String)>, Error> {
        match organization_ids {
            None => Ok(Organization::find()
                .order_by_asc(organization::Column::Id)
                .all(conn)
                .await?
                .into_iter()
                .map(|org| (org.id, org.currency))
                .collect()),
            Some(ids) => {
                let mut seen = HashSet::new();
                let ids: Vec<i64> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

                let organizations = Organization::find()
                    .filter(organization::Column::Id.is_in(ids.iter().copied()))
                    .all(conn)
                    .await?;

                let by_id: std::collections::HashMap<i64, String> = organizations
                    .into_iter()
                    .map(|org| (org.id, org.currency))
                    .collect();

                ids.into_iter()
                    .map(|id| {
                        by_id
                            .get(&id)
                            .map(|currency| (id, currency.clone()))
                            .ok_or_else(|| Error::not_found("organization"))
                    })
                    .collect()
            }
        }
    }
}
