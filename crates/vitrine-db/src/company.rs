//! The `company_config` singleton.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyConfigRow {
    pub name: String,
    pub whatsapp: String,
    pub instagram: String,
    pub address: Option<String>,
    pub facebook_pixel_id: Option<String>,
    pub google_analytics_id: Option<String>,
    pub map_iframe: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of the company configuration.
#[derive(Debug, Clone, Default)]
pub struct CompanyConfigWrite {
    pub name: String,
    pub whatsapp: String,
    pub instagram: String,
    pub address: Option<String>,
    pub facebook_pixel_id: Option<String>,
    pub google_analytics_id: Option<String>,
    pub map_iframe: Option<String>,
}

impl From<&vitrine_core::CompanySeed> for CompanyConfigWrite {
    fn from(seed: &vitrine_core::CompanySeed) -> Self {
        Self {
            name: seed.name.clone(),
            whatsapp: seed.whatsapp.clone(),
            instagram: seed.instagram.clone(),
            address: seed.address.clone(),
            facebook_pixel_id: seed.facebook_pixel_id.clone(),
            google_analytics_id: seed.google_analytics_id.clone(),
            map_iframe: seed.map_iframe.clone(),
        }
    }
}

const COMPANY_COLUMNS: &str = "name, whatsapp, instagram, address, facebook_pixel_id, \
     google_analytics_id, map_iframe, updated_at";

/// Returns the company configuration, or `None` before it is first saved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_company_config(pool: &PgPool) -> Result<Option<CompanyConfigRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyConfigRow>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM company_config WHERE id = 1"
    ))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Writes the singleton row, inserting it on first use.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_company_config(
    conn: &mut PgConnection,
    config: &CompanyConfigWrite,
) -> Result<CompanyConfigRow, DbError> {
    let row = sqlx::query_as::<_, CompanyConfigRow>(&format!(
        "INSERT INTO company_config \
           (id, name, whatsapp, instagram, address, facebook_pixel_id, google_analytics_id, map_iframe) \
         VALUES (1, $1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (id) DO UPDATE SET \
             name                = EXCLUDED.name, \
             whatsapp            = EXCLUDED.whatsapp, \
             instagram           = EXCLUDED.instagram, \
             address             = EXCLUDED.address, \
             facebook_pixel_id   = EXCLUDED.facebook_pixel_id, \
             google_analytics_id = EXCLUDED.google_analytics_id, \
             map_iframe          = EXCLUDED.map_iframe, \
             updated_at          = NOW() \
         RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(&config.name)
    .bind(&config.whatsapp)
    .bind(&config.instagram)
    .bind(config.address.as_deref())
    .bind(config.facebook_pixel_id.as_deref())
    .bind(config.google_analytics_id.as_deref())
    .bind(config.map_iframe.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(row)
}
