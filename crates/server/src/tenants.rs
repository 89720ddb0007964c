//! Tenant bootstrap and company-name management.
//!
//! A tenant is an opaque location ID; the first request for an unknown ID
//! creates its row implicitly.

use axum::extract::{Query, State};
use axum::Json;
use guidepost_db::{TenantRecord, TenantRepository};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{bad_request, db_error, ErrorResponse};
use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct InitTenantRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TenantView {
    pub id: String,
    pub location_id: String,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TenantRecord> for TenantView {
    fn from(record: TenantRecord) -> Self {
        Self {
            id: record.id,
            location_id: record.location_id,
            full_name: record.full_name,
            company_name: record.company_name,
            email: record.email,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitTenantResponse {
    pub tenant: TenantView,
}

pub async fn init_tenant(
    State(state): State<AppState>,
    Json(body): Json<InitTenantRequest>,
) -> Result<Json<InitTenantResponse>, ErrorResponse> {
    let location_id = body.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let tenant = TenantRepository::new(state.db_pool.clone())
        .get_or_create(location_id, body.name.as_deref())
        .await
        .map_err(db_error)?;

    info!(
        event_name = "tenants.initialized",
        location_id = %location_id,
        "tenant row ready"
    );

    Ok(Json(InitTenantResponse { tenant: tenant.into() }))
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    #[serde(rename = "locationId")]
    pub location_id: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyNameResponse {
    #[serde(rename = "companyName")]
    pub company_name: Option<String>,
}

pub async fn get_company_name(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<CompanyNameResponse>, ErrorResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let company_name = TenantRepository::new(state.db_pool.clone())
        .company_name(location_id)
        .await
        .map_err(db_error)?;

    Ok(Json(CompanyNameResponse { company_name }))
}

#[derive(Debug, Deserialize)]
pub struct SetCompanyNameRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn set_company_name(
    State(state): State<AppState>,
    Json(body): Json<SetCompanyNameRequest>,
) -> Result<Json<SuccessResponse>, ErrorResponse> {
    let location_id = body.location_id.trim();
    let company_name = body.company_name.trim();
    if location_id.is_empty() || company_name.is_empty() {
        return Err(bad_request("Location ID and company name are required"));
    }

    TenantRepository::new(state.db_pool.clone())
        .set_company_name(location_id, company_name)
        .await
        .map_err(db_error)?;

    info!(
        event_name = "tenants.company_name_updated",
        location_id = %location_id,
        "company name updated"
    );

    Ok(Json(SuccessResponse { success: true }))
}
