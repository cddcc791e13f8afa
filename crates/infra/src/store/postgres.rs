//! Postgres-backed party store.
//!
//! Records are stored as JSONB documents (see `migrations/0001_parties.sql`), keyed and
//! scoped by plain columns. Store scoping is part of every WHERE clause.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Duplicate` | Second store-info row for a (customer, store) pair |
//! | Database (invalid text representation) | `22P02` | `InvalidId` | Identifier failed to cast |
//! | Database (other) | Any other | `Storage` | Other database errors |
//! | PoolClosed | N/A | `Storage` | Connection pool was closed |
//! | Other | N/A | `Storage` | Network errors, connection failures, etc. |

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use partyhub_core::{CustomerId, PartyId, StoreId};
use partyhub_parties::{
    BalanceFilter, BalanceTotals, Customer, CustomerStoreInfo, ListQuery, ListedCustomer,
    NewCustomer, Page, PartyPatch, PartyType, Sort, SortDirection, SortField, Store, Supplier,
};

use super::{PartyStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_parties.sql");

fn table(party_type: PartyType) -> &'static str {
    match party_type {
        PartyType::Customer => "customer_store_infos",
        PartyType::Supplier => "suppliers",
    }
}

/// Postgres-backed party store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; the store can be shared freely.
#[derive(Debug, Clone)]
pub struct PostgresPartyStore {
    pool: Arc<PgPool>,
}

impl PostgresPartyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_doc<T: DeserializeOwned>(
        &self,
        operation: &str,
        sql: &str,
        first: Uuid,
        second: Option<Uuid>,
    ) -> Result<Option<T>, StoreError> {
        let mut query = sqlx::query(sql).bind(first);
        if let Some(second) = second {
            query = query.bind(second);
        }
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|row| decode(&row, "doc")).transpose()
    }

    async fn patch_doc<T: DeserializeOwned>(
        &self,
        party_type: PartyType,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<T>, StoreError> {
        let doc = patch
            .to_document(Utc::now())
            .map_err(|e| StoreError::Storage(format!("patch failed: {e}")))?;
        let sql = format!(
            "UPDATE {} SET doc = doc || $2 WHERE id = $1 RETURNING doc",
            table(party_type)
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(JsonValue::Object(doc))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_party", e))?;
        row.map(|row| decode(&row, "doc")).transpose()
    }

    async fn count(
        &self,
        party_type: PartyType,
        store_id: StoreId,
        balance: Option<BalanceFilter>,
    ) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM ");
        qb.push(table(party_type)).push(" t");
        push_list_filter(&mut qb, store_id, balance);

        let row = qb
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_parties", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::Storage(format!("failed to read count: {e}")))?;
        Ok(total.max(0) as u64)
    }
}

fn encode<T: Serialize>(record: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(record)
        .map_err(|e| StoreError::Storage(format!("document serialization failed: {e}")))
}

fn decode<T: DeserializeOwned>(row: &PgRow, column: &str) -> Result<T, StoreError> {
    let doc: JsonValue = row
        .try_get(column)
        .map_err(|e| StoreError::Storage(format!("failed to read {column}: {e}")))?;
    serde_json::from_value(doc)
        .map_err(|e| StoreError::Storage(format!("malformed {column} document: {e}")))
}

/// Store scope, soft-delete exclusion and the optional balance comparison.
fn push_list_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    store_id: StoreId,
    balance: Option<BalanceFilter>,
) {
    qb.push(" WHERE t.store_id = ").push_bind(*store_id.as_uuid());
    qb.push(" AND COALESCE((t.doc->>'isDeleted')::boolean, false) = false");
    if let Some(filter) = balance {
        if filter.includes_absent() {
            qb.push(" AND COALESCE((t.doc->>'balance')::float8, 0) = ")
                .push_bind(filter.value);
        } else {
            qb.push(" AND (t.doc->>'balance')::float8 ")
                .push(filter.op.as_sql())
                .push(" ")
                .push_bind(filter.value);
        }
    }
}

// Absent values sort first ascending; ties keep insertion order.
fn order_by(sort: Sort) -> String {
    let direction = sort.direction.as_sql();
    let nulls = match sort.direction {
        SortDirection::Asc => "NULLS FIRST",
        SortDirection::Desc => "NULLS LAST",
    };
    let key = sort.field.document_key();
    let expr = match sort.field {
        SortField::Id => return format!(" ORDER BY t.seq {direction}"),
        SortField::CreatedAt => format!("(t.doc->>'{key}')::timestamptz"),
        f if f.is_numeric() => format!("(t.doc->>'{key}')::float8"),
        _ => format!("lower(t.doc->>'{key}') COLLATE \"und-x-icu\""),
    };
    format!(" ORDER BY {expr} {direction} {nulls}, t.seq ASC")
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery, party_type: PartyType) {
    qb.push(order_by(query.sort.for_party(party_type)));
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(query.limit()).unwrap_or(i64::MAX));
    qb.push(" OFFSET ")
        .push_bind(i64::try_from(query.skip()).unwrap_or(i64::MAX));
}

async fn insert_customer(
    tx: &mut Transaction<'_, Postgres>,
    customer: &Customer,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO customers (id, phone_number, created_at, doc)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(*customer.id.as_uuid())
    .bind(&customer.phone_number)
    .bind(customer.created_at)
    .bind(encode(customer)?)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_customer", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl PartyStore for PostgresPartyStore {
    #[instrument(skip(self), err)]
    async fn find_store_by_phone(&self, phone_number: &str) -> Result<Option<Store>, StoreError> {
        let row = sqlx::query(
            "SELECT doc FROM stores WHERE phone_number = $1 ORDER BY seq DESC LIMIT 1",
        )
        .bind(phone_number)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_store_by_phone", e))?;
        row.map(|row| decode(&row, "doc")).transpose()
    }

    /// Serialized per phone number with a transaction-scoped advisory lock.
    #[instrument(skip(self, seed), err)]
    async fn resolve_customer(&self, seed: NewCustomer) -> Result<Customer, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&seed.phone_number)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_phone_number", e))?;

        let existing = sqlx::query(
            r#"
            SELECT doc FROM customers
            WHERE phone_number = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(&seed.phone_number)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("resolve_customer", e))?;

        let customer = match existing {
            Some(row) => decode(&row, "doc")?,
            None => {
                let customer = seed.into_customer(Utc::now());
                insert_customer(&mut tx, &customer).await?;
                debug!(customer_id = %customer.id, "customer identity created");
                customer
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(customer)
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        self.fetch_doc(
            "get_customer",
            "SELECT doc FROM customers WHERE id = $1",
            *id.as_uuid(),
            None,
        )
        .await
    }

    #[instrument(skip(self), fields(store_id = %store_id, customer_id = %customer_id), err)]
    async fn find_customer_store_info(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        self.fetch_doc(
            "find_customer_store_info",
            "SELECT doc FROM customer_store_infos WHERE customer_id = $1 AND store_id = $2",
            *customer_id.as_uuid(),
            Some(*store_id.as_uuid()),
        )
        .await
    }

    #[instrument(
        skip(self, info),
        fields(store_id = %info.store_id, customer_id = %info.customer_id),
        err
    )]
    async fn insert_customer_store_info(
        &self,
        info: CustomerStoreInfo,
    ) -> Result<CustomerStoreInfo, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO customer_store_infos (id, customer_id, store_id, doc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(*info.id.as_uuid())
        .bind(*info.customer_id.as_uuid())
        .bind(*info.store_id.as_uuid())
        .bind(encode(&info)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_customer_store_info", e))?;
        Ok(info)
    }

    #[instrument(skip(self), fields(store_id = %store_id, party_id = %id), err)]
    async fn get_customer_store_info(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        self.fetch_doc(
            "get_customer_store_info",
            "SELECT doc FROM customer_store_infos WHERE id = $1 AND store_id = $2",
            *id.as_uuid(),
            Some(*store_id.as_uuid()),
        )
        .await
    }

    #[instrument(skip(self, patch), fields(party_id = %id), err)]
    async fn update_customer_store_info(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        self.patch_doc(PartyType::Customer, id, patch).await
    }

    #[instrument(skip(self, query), fields(store_id = %store_id), err)]
    async fn list_customer_store_infos(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<ListedCustomer>, StoreError> {
        let total = self.count(PartyType::Customer, store_id, query.balance).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.doc AS doc, c.doc AS customer FROM customer_store_infos t \
             LEFT JOIN customers c ON c.id = t.customer_id",
        );
        push_list_filter(&mut qb, store_id, query.balance);
        push_page(&mut qb, query, PartyType::Customer);

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customer_store_infos", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let customer: Option<JsonValue> = row
                .try_get("customer")
                .map_err(|e| StoreError::Storage(format!("failed to read customer: {e}")))?;
            items.push(ListedCustomer {
                store_info: decode(&row, "doc")?,
                customer: customer
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| StoreError::Storage(format!("malformed customer document: {e}")))?,
            });
        }
        Ok(Page { items, total })
    }

    #[instrument(skip(self, supplier), fields(store_id = %supplier.store_id), err)]
    async fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier, StoreError> {
        sqlx::query("INSERT INTO suppliers (id, store_id, doc) VALUES ($1, $2, $3)")
            .bind(*supplier.id.as_uuid())
            .bind(*supplier.store_id.as_uuid())
            .bind(encode(&supplier)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(supplier)
    }

    #[instrument(skip(self), fields(store_id = %store_id, party_id = %id), err)]
    async fn get_supplier(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<Supplier>, StoreError> {
        self.fetch_doc(
            "get_supplier",
            "SELECT doc FROM suppliers WHERE id = $1 AND store_id = $2",
            *id.as_uuid(),
            Some(*store_id.as_uuid()),
        )
        .await
    }

    #[instrument(skip(self, patch), fields(party_id = %id), err)]
    async fn update_supplier(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<Supplier>, StoreError> {
        self.patch_doc(PartyType::Supplier, id, patch).await
    }

    #[instrument(skip(self, query), fields(store_id = %store_id), err)]
    async fn list_suppliers(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<Supplier>, StoreError> {
        let total = self.count(PartyType::Supplier, store_id, query.balance).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.doc AS doc FROM suppliers t");
        push_list_filter(&mut qb, store_id, query.balance);
        push_page(&mut qb, query, PartyType::Supplier);

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_suppliers", e))?;

        let items = rows
            .iter()
            .map(|row| decode(row, "doc"))
            .collect::<Result<Vec<Supplier>, _>>()?;
        Ok(Page { items, total })
    }

    #[instrument(skip(self), fields(store_id = %store_id), err)]
    async fn balance_totals(
        &self,
        party_type: PartyType,
        store_id: StoreId,
    ) -> Result<BalanceTotals, StoreError> {
        let sql = format!(
            r#"
            SELECT
                COUNT(*) AS records,
                COALESCE(SUM(b) FILTER (WHERE b < 0), 0)::float8 AS negative,
                COALESCE(SUM(b) FILTER (WHERE b > 0), 0)::float8 AS positive
            FROM (
                SELECT (doc->>'balance')::float8 AS b FROM {} WHERE store_id = $1
            ) balances
            "#,
            table(party_type)
        );
        let row = sqlx::query(&sql)
            .bind(*store_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("balance_totals", e))?;

        let read = |column: &str| -> Result<f64, StoreError> {
            row.try_get(column)
                .map_err(|e| StoreError::Storage(format!("failed to read {column}: {e}")))
        };
        let records: i64 = row
            .try_get("records")
            .map_err(|e| StoreError::Storage(format!("failed to read records: {e}")))?;
        if records == 0 {
            return Err(StoreError::NoRecords(format!(
                "no {party_type} records for store {store_id}"
            )));
        }

        Ok(BalanceTotals {
            total_balance_less_than_zero: read("negative")?,
            total_balance_greater_than_zero: read("positive")?,
        })
    }

    #[instrument(skip(self, ids), fields(store_id = %store_id, requested = ids.len()), err)]
    async fn soft_delete(
        &self,
        party_type: PartyType,
        store_id: StoreId,
        ids: &[PartyId],
    ) -> Result<u64, StoreError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET doc = doc || jsonb_build_object('isDeleted', true, 'updatedAt', $3::text)
            WHERE store_id = $1 AND id = ANY($2)
            "#,
            table(party_type)
        );
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query(&sql)
            .bind(*store_id.as_uuid())
            .bind(ids)
            .bind(Utc::now().to_rfc3339())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("soft_delete", e))?;
        Ok(result.rows_affected())
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => StoreError::Duplicate(msg),
                // Invalid text representation (failed cast)
                Some("22P02") => StoreError::InvalidId(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
