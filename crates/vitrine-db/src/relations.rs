//! Full-replace synchronisation of child and reference relations.
//!
//! Every function here takes the caller's connection so the relation writes
//! share the transaction of the parent row. A [`BatchField::Absent`] or
//! [`BatchField::Malformed`] batch leaves the relation as it is; a supplied
//! batch (even an empty one) replaces it entirely.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use vitrine_core::{BatchField, KitInput, ProductInput, VariantSpec};

use crate::DbError;

/// Row counts written by one synchronisation pass. `None` means the relation
/// was left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub variants: Option<u64>,
    pub finishings: Option<u64>,
    pub upsells: Option<u64>,
    pub kit_products: Option<u64>,
}

fn supplied<'a, T>(batch: &'a BatchField<T>, relation: &str, parent_id: i64) -> Option<&'a [T]> {
    if let BatchField::Malformed(reason) = batch {
        tracing::warn!(relation, parent_id, %reason, "ignoring malformed batch");
    }
    batch.supplied()
}

/// Deletes every variant of `product_id` and inserts `variants` in order.
///
/// Returns the number of variants inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn replace_variants(
    conn: &mut PgConnection,
    product_id: i64,
    variants: &[VariantSpec],
) -> Result<u64, DbError> {
    sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if variants.is_empty() {
        return Ok(0);
    }

    let names: Vec<String> = variants.iter().map(|v| v.name.clone()).collect();
    let prices: Vec<Decimal> = variants.iter().map(|v| v.price).collect();

    // WITH ORDINALITY keeps insert order equal to batch order, so ids follow it.
    let result = sqlx::query(
        "INSERT INTO product_variants (product_id, name, price) \
         SELECT $1, v.name, v.price \
         FROM UNNEST($2::TEXT[], $3::NUMERIC[]) WITH ORDINALITY AS v(name, price, ord) \
         ORDER BY v.ord",
    )
    .bind(product_id)
    .bind(&names)
    .bind(&prices)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Sets the finishings of `product_id` to exactly the existing ids in
/// `finishing_ids`. Unknown ids are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn set_finishings(
    conn: &mut PgConnection,
    product_id: i64,
    finishing_ids: &[i64],
) -> Result<u64, DbError> {
    sqlx::query("DELETE FROM product_finishings WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if finishing_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "INSERT INTO product_finishings (product_id, finishing_id) \
         SELECT $1, f.id FROM finishings f WHERE f.id = ANY($2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(product_id)
    .bind(finishing_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Sets the upsell targets of `product_id`. The product itself and unknown
/// ids are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn set_upsells(
    conn: &mut PgConnection,
    product_id: i64,
    upsell_ids: &[i64],
) -> Result<u64, DbError> {
    sqlx::query("DELETE FROM product_upsells WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if upsell_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "INSERT INTO product_upsells (product_id, upsell_product_id) \
         SELECT $1, p.id FROM products p WHERE p.id = ANY($2) AND p.id <> $1 \
         ON CONFLICT DO NOTHING",
    )
    .bind(product_id)
    .bind(upsell_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Sets the member products of `kit_id`. Unknown ids are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn set_kit_products(
    conn: &mut PgConnection,
    kit_id: i64,
    product_ids: &[i64],
) -> Result<u64, DbError> {
    sqlx::query("DELETE FROM kit_products WHERE kit_id = $1")
        .bind(kit_id)
        .execute(&mut *conn)
        .await?;

    if product_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "INSERT INTO kit_products (kit_id, product_id) \
         SELECT $1, p.id FROM products p WHERE p.id = ANY($2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(kit_id)
    .bind(product_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Applies every supplied child batch of a product write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn sync_product_relations(
    conn: &mut PgConnection,
    product_id: i64,
    input: &ProductInput,
) -> Result<SyncReport, DbError> {
    let mut report = SyncReport::default();

    if let Some(variants) = supplied(&input.variants, "variants", product_id) {
        report.variants = Some(replace_variants(&mut *conn, product_id, variants).await?);
    }
    if let Some(ids) = supplied(&input.finishings, "finishings", product_id) {
        report.finishings = Some(set_finishings(&mut *conn, product_id, ids).await?);
    }
    if let Some(ids) = supplied(&input.upsells, "upsells", product_id) {
        report.upsells = Some(set_upsells(&mut *conn, product_id, ids).await?);
    }

    Ok(report)
}

/// Applies the product batch of a kit write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn sync_kit_relations(
    conn: &mut PgConnection,
    kit_id: i64,
    input: &KitInput,
) -> Result<SyncReport, DbError> {
    let mut report = SyncReport::default();

    if let Some(ids) = supplied(&input.products, "kit_products", kit_id) {
        report.kit_products = Some(set_kit_products(&mut *conn, kit_id, ids).await?);
    }

    Ok(report)
}
