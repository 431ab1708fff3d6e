use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use vitrine_db::{CompanyConfigRow, CompanyConfigWrite};

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

const DEFAULT_COMPANY_NAME: &str = "Cloud Design";

#[derive(Debug, Deserialize)]
pub(super) struct CompanyRequest {
    pub name: Option<String>,
    pub whatsapp: String,
    pub instagram: String,
    pub address: Option<String>,
    pub facebook_pixel_id: Option<String>,
    pub google_analytics_id: Option<String>,
    pub map_iframe: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn check_len(rid: &str, field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(validation_error(
            rid,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(())
}

impl CompanyRequest {
    fn into_write(self, rid: &str) -> Result<CompanyConfigWrite, ApiError> {
        let name = blank_to_none(self.name).unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_owned());
        let whatsapp = self.whatsapp.trim().to_owned();
        let instagram = self.instagram.trim().to_owned();
        let facebook_pixel_id = blank_to_none(self.facebook_pixel_id);
        let google_analytics_id = blank_to_none(self.google_analytics_id);

        check_len(rid, "name", &name, 100)?;
        check_len(rid, "whatsapp", &whatsapp, 20)?;
        check_len(rid, "instagram", &instagram, 100)?;
        for (field, value) in [
            ("facebook_pixel_id", &facebook_pixel_id),
            ("google_analytics_id", &google_analytics_id),
        ] {
            if let Some(v) = value {
                check_len(rid, field, v, 50)?;
            }
        }

        Ok(CompanyConfigWrite {
            name,
            whatsapp,
            instagram,
            address: blank_to_none(self.address),
            facebook_pixel_id,
            google_analytics_id,
            map_iframe: blank_to_none(self.map_iframe),
        })
    }
}

/// GET /api/v1/company
pub(super) async fn get_company(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CompanyConfigRow>>, ApiError> {
    let rid = &req_id.0;
    let row = vitrine_db::get_company_config(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "company configuration not set"))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// PUT /api/v1/company: replaces the whole configuration.
pub(super) async fn put_company(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CompanyRequest>,
) -> Result<Json<ApiResponse<CompanyConfigRow>>, ApiError> {
    let rid = &req_id.0;
    let write = body.into_write(rid)?;

    let mut conn = state
        .pool
        .acquire()
        .await
        .map_err(|e| map_db_error(rid.clone(), &vitrine_db::DbError::from(e)))?;
    let row = vitrine_db::upsert_company_config(&mut conn, &write)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}
