//! In-memory stand-in for the subset of the Quinyx API the client tests use.
//!
//! # Design
//! All state lives behind one `Arc<RwLock<Store>>` created per `app()`, so
//! every router instance starts from the same seeded categories. A response
//! middleware stamps each response with a fresh request UID, errors
//! included. Error bodies are `{"message": ...}`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const REQUEST_UID_HEADER: &str = "x-quinyx-request-uid";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    pub id: i32,
    pub external_id: String,
    pub name: String,
    pub color: String,
    pub tag_type: String,
}

/// A tag; fields the server does not interpret are kept verbatim.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payload {
    pub data: f64,
    pub timestamp: Value,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRow {
    pub external_forecast_variable_id: Option<String>,
    pub external_unit_id: Option<String>,
    pub external_section_id: Option<String>,
    #[serde(default)]
    pub forecast_data_payload: Vec<Payload>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DataUpload {
    pub requests: Vec<DataRow>,
}

/// Stored data as served back (`dataPayload`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProvider {
    pub external_forecast_variable_id: String,
    pub external_unit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_section_id: Option<String>,
    pub data_payload: Vec<Payload>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRule {
    pub external_id: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    pub external_unit_id: Option<String>,
    pub external_section_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub append_data: Option<bool>,
    pub external_dynamic_rule_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    categories: BTreeMap<String, TagCategory>,
    /// category -> tag external id -> tag
    tags: HashMap<String, BTreeMap<String, Tag>>,
    /// (variable, unit) -> rows
    actual_data: HashMap<(String, String), Vec<DataProvider>>,
    /// unit -> rules in insertion order
    dynamic_rules: HashMap<String, Vec<DynamicRule>>,
}

impl Store {
    fn seeded() -> Self {
        let categories = [
            (1, "cost-centers", "Cost centers", "#ff0000", "COST_CENTER"),
            (2, "projects", "Projects", "#00ff00", "PROJECT"),
        ]
        .into_iter()
        .map(|(id, external_id, name, color, tag_type)| {
            let category = TagCategory {
                id,
                external_id: external_id.to_string(),
                name: name.to_string(),
                color: color.to_string(),
                tag_type: tag_type.to_string(),
            };
            (category.external_id.clone(), category)
        })
        .collect();
        Self {
            categories,
            ..Self::default()
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// JSON error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/tags/categories", get(list_categories))
        .route("/tags/categories/{category}", get(get_category))
        .route(
            "/tags/categories/{category}/tags",
            get(first_tag).post(create_tag),
        )
        .route(
            "/tags/categories/{category}/tags/{tag}",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
        .route(
            "/forecasts/actual-data",
            post(upload_actual_data),
        )
        .route(
            "/forecasts/forecast-variables/{variable}/actual-data",
            get(get_actual_data).delete(delete_actual_data),
        )
        .route(
            "/forecasts/dynamic-rules",
            get(list_dynamic_rules)
                .post(create_dynamic_rule)
                .put(update_dynamic_rule)
                .delete(delete_dynamic_rule),
        )
        .layer(middleware::map_response(stamp_request_uid))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn stamp_request_uid(mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_UID_HEADER), value);
    }
    response
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing required parameter {name}")))
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

async fn list_categories(State(db): State<Db>) -> Json<Vec<TagCategory>> {
    Json(db.read().await.categories.values().cloned().collect())
}

async fn get_category(
    State(db): State<Db>,
    Path(category): Path<String>,
) -> Result<Json<TagCategory>, ApiError> {
    let store = db.read().await;
    store
        .categories
        .get(&category)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("category"))
}

/// The listing endpoint answers with a single tag.
async fn first_tag(
    State(db): State<Db>,
    Path(category): Path<String>,
) -> Result<Json<Tag>, ApiError> {
    let store = db.read().await;
    if !store.categories.contains_key(&category) {
        return Err(ApiError::not_found("category"));
    }
    store
        .tags
        .get(&category)
        .and_then(|tags| tags.values().next())
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("tag"))
}

async fn create_tag(
    State(db): State<Db>,
    Path(category): Path<String>,
    Json(mut tag): Json<Tag>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let mut store = db.write().await;
    if !store.categories.contains_key(&category) {
        return Err(ApiError::not_found("category"));
    }
    let external_id = require(&tag.external_id, "externalId")?.to_string();
    let tags = store.tags.entry(category.clone()).or_default();
    if tags.contains_key(&external_id) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("tag {external_id} already exists"),
        ));
    }
    tag.category_external_id = Some(category);
    tags.insert(external_id, tag.clone());
    tracing::debug!(tag = ?tag.external_id, "tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn get_tag(
    State(db): State<Db>,
    Path((category, tag)): Path<(String, String)>,
) -> Result<Json<Tag>, ApiError> {
    let store = db.read().await;
    store
        .tags
        .get(&category)
        .and_then(|tags| tags.get(&tag))
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("tag"))
}

async fn update_tag(
    State(db): State<Db>,
    Path((category, tag_id)): Path<(String, String)>,
    Json(input): Json<Tag>,
) -> Result<Json<Tag>, ApiError> {
    if input
        .category_external_id
        .as_deref()
        .is_some_and(|c| c != category)
    {
        return Err(ApiError::bad_request("categoryExternalId cannot be changed"));
    }
    let mut store = db.write().await;
    let tag = store
        .tags
        .get_mut(&category)
        .and_then(|tags| tags.get_mut(&tag_id))
        .ok_or_else(|| ApiError::not_found("tag"))?;
    if let Some(name) = input.name {
        tag.name = Some(name);
    }
    tag.rest.extend(input.rest);
    Ok(Json(tag.clone()))
}

async fn delete_tag(
    State(db): State<Db>,
    Path((category, tag)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .tags
        .get_mut(&category)
        .and_then(|tags| tags.remove(&tag))
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("tag"))
}

// ---------------------------------------------------------------------------
// Actual data
// ---------------------------------------------------------------------------

async fn upload_actual_data(
    State(db): State<Db>,
    Query(query): Query<ForecastQuery>,
    Json(upload): Json<DataUpload>,
) -> Result<StatusCode, ApiError> {
    let mut rows = Vec::with_capacity(upload.requests.len());
    for row in upload.requests {
        let variable = require(&row.external_forecast_variable_id, "externalForecastVariableId")?;
        let unit = require(&row.external_unit_id, "externalUnitId")?;
        rows.push((
            (variable.to_string(), unit.to_string()),
            DataProvider {
                external_forecast_variable_id: variable.to_string(),
                external_unit_id: unit.to_string(),
                external_section_id: row.external_section_id.clone(),
                data_payload: row.forecast_data_payload,
            },
        ));
    }

    let append = query.append_data.unwrap_or(false);
    let mut store = db.write().await;
    if !append {
        for (key, _) in &rows {
            store.actual_data.remove(key);
        }
    }
    let count = rows.len();
    for (key, row) in rows {
        store.actual_data.entry(key).or_default().push(row);
    }
    tracing::debug!(rows = count, append, "actual data stored");
    Ok(StatusCode::OK)
}

fn range_key(variable: String, query: &ForecastQuery) -> Result<(String, String), ApiError> {
    require(&query.start_time, "startTime")?;
    require(&query.end_time, "endTime")?;
    let unit = require(&query.external_unit_id, "externalUnitId")?;
    Ok((variable, unit.to_string()))
}

async fn get_actual_data(
    State(db): State<Db>,
    Path(variable): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<DataProvider>>, ApiError> {
    let key = range_key(variable, &query)?;
    let store = db.read().await;
    let rows = store
        .actual_data
        .get(&key)
        .map(|rows| {
            rows.iter()
                .filter(|row| {
                    query.external_section_id.is_none()
                        || row.external_section_id == query.external_section_id
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(rows))
}

async fn delete_actual_data(
    State(db): State<Db>,
    Path(variable): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<StatusCode, ApiError> {
    let key = range_key(variable, &query)?;
    db.write().await.actual_data.remove(&key);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dynamic rules
// ---------------------------------------------------------------------------

async fn list_dynamic_rules(
    State(db): State<Db>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<DynamicRule>>, ApiError> {
    let unit = require(&query.external_unit_id, "externalUnitId")?;
    let store = db.read().await;
    Ok(Json(
        store.dynamic_rules.get(unit).cloned().unwrap_or_default(),
    ))
}

async fn create_dynamic_rule(
    State(db): State<Db>,
    Query(query): Query<ForecastQuery>,
    Json(rule): Json<DynamicRule>,
) -> Result<(StatusCode, Json<DynamicRule>), ApiError> {
    let unit = require(&query.external_unit_id, "externalUnitId")?;
    let mut store = db.write().await;
    let rules = store.dynamic_rules.entry(unit.to_string()).or_default();
    if rules.iter().any(|r| r.external_id == rule.external_id) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("rule {} already exists", rule.external_id),
        ));
    }
    rules.push(rule.clone());
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn update_dynamic_rule(
    State(db): State<Db>,
    Query(query): Query<ForecastQuery>,
    Json(rule): Json<DynamicRule>,
) -> Result<StatusCode, ApiError> {
    let unit = require(&query.external_unit_id, "externalUnitId")?;
    let mut store = db.write().await;
    let existing = store
        .dynamic_rules
        .get_mut(unit)
        .and_then(|rules| rules.iter_mut().find(|r| r.external_id == rule.external_id))
        .ok_or_else(|| ApiError::not_found("rule"))?;
    *existing = rule;
    Ok(StatusCode::OK)
}

async fn delete_dynamic_rule(
    State(db): State<Db>,
    Query(query): Query<ForecastQuery>,
) -> Result<StatusCode, ApiError> {
    let unit = require(&query.external_unit_id, "externalUnitId")?;
    let rule_id = require(&query.external_dynamic_rule_id, "externalDynamicRuleId")?;
    let mut store = db.write().await;
    let rules = store
        .dynamic_rules
        .get_mut(unit)
        .ok_or_else(|| ApiError::not_found("rule"))?;
    let before = rules.len();
    rules.retain(|r| r.external_id != rule_id);
    if rules.len() == before {
        return Err(ApiError::not_found("rule"));
    }
    Ok(StatusCode::NO_CONTENT)
}
