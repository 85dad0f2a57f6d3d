//! Catalog browsing endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use medlookup_core::resolver::escape_for_pattern_match;
use medlookup_core::store::{Condition, Field, MedicineQuery, SortKey};
use medlookup_core::MedicineRecord;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::state::AppState;

const MAX_PAGE: usize = 1_000_000;
const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 500;
const DEFAULT_SEARCH_LIMIT: usize = 50;
const MAX_SEARCH_LIMIT: usize = 200;

/// Query values arrive as strings so that junk falls back to the default
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(rename = "type")]
    pub dosage_form: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub count: usize,
    pub data: Vec<MedicineRecord>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub data: Vec<MedicineRecord>,
}

/// Parse a positive integer, falling back to `default`, then clamp to `1..=max`.
fn bounded(raw: Option<&str>, default: usize, max: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
        .clamp(1, max)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// GET /api/medguide/medicines
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = bounded(params.page.as_deref(), 1, MAX_PAGE);
    let limit = bounded(params.limit.as_deref(), DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let query = MedicineQuery::new()
        .sort_by(SortKey::Name)
        .limit(limit)
        .offset((page - 1).saturating_mul(limit));

    let data = state.store.find(&query).await?;
    let total = state.store.count().await?;

    Ok(Json(ListResponse {
        page,
        limit,
        total,
        count: data.len(),
        data,
    }))
}

/// GET /api/medguide/medicines/search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let filters = [
        (Field::Name, non_empty(&params.name)),
        (Field::Manufacturer, non_empty(&params.manufacturer)),
        (Field::DosageForm, non_empty(&params.dosage_form)),
    ];
    if filters.iter().all(|(_, value)| value.is_none()) {
        return Err(ApiError::bad_request(
            "Provide at least one query parameter: name, manufacturer, or type",
        ));
    }

    let limit = bounded(params.limit.as_deref(), DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let query = filters
        .iter()
        .filter_map(|(field, value)| value.map(|v| (*field, v)))
        .fold(MedicineQuery::new(), |query, (field, value)| {
            query.and(Condition::matches(
                field,
                escape_for_pattern_match(&value.to_lowercase()),
            ))
        })
        .sort_by(SortKey::Name)
        .limit(limit);

    let data = state.store.find(&query).await?;
    Ok(Json(SearchResponse {
        count: data.len(),
        data,
    }))
}
