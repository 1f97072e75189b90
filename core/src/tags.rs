//! Tag categories and tags.
//!
//! Endpoints live under `tags/categories`. Tags and categories are
//! addressed by their external ids.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Response};
use crate::error::{Result, ValidationError};
use crate::http::{CallContext, HttpMethod};
use crate::timestamp::Timestamp;

/// A tag (`TagIntegration` in the API).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periods: Vec<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_scheduling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_external_id: Option<String>,
}

/// Geofence: a point and a radius in meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A validity period of a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub period_type: Option<PeriodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<TagType>,
}

/// Kind of a tag category. Unknown values fail decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagType {
    CostCenter,
    Project,
    Account,
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    Period,
    Days,
    Weeks,
}

/// Tag endpoints, obtained from `Client::tags`.
#[derive(Debug, Clone, Copy)]
pub struct TagsService<'a> {
    client: &'a Client,
}

impl<'a> TagsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn get_all_categories(&self, ctx: &CallContext) -> Result<(Vec<TagCategory>, Response)> {
        let req = self.client.new_request(HttpMethod::Get, "tags/categories")?;
        self.client.execute(ctx, req)
    }

    pub fn get_category(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
    ) -> Result<(TagCategory, Response)> {
        let segments = ["tags", "categories", category_external_id];
        let req = self.client.new_request_segments(HttpMethod::Get, &segments)?;
        self.client.execute(ctx, req)
    }

    /// Despite the endpoint name, the API answers with a single tag.
    pub fn get_all_tags(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
    ) -> Result<(Tag, Response)> {
        let req = self.client.new_request_segments(
            HttpMethod::Get,
            &["tags", "categories", category_external_id, "tags"],
        )?;
        self.client.execute(ctx, req)
    }

    pub fn get_tag(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
        tag_external_id: &str,
    ) -> Result<(Tag, Response)> {
        let path = tag_path(category_external_id, tag_external_id);
        let req = self.client.new_request_segments(HttpMethod::Get, &path)?;
        self.client.execute(ctx, req)
    }

    pub fn create_tag(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
        tag: &Tag,
    ) -> Result<(Tag, Response)> {
        let req = self
            .client
            .new_request_segments(
                HttpMethod::Post,
                &["tags", "categories", category_external_id, "tags"],
            )?
            .with_json_body(tag)?;
        self.client.execute(ctx, req)
    }

    /// Update the fields set in `tag`.
    ///
    /// A tag cannot be moved to another category; a differing
    /// `category_external_id` is rejected before sending.
    pub fn update_tag(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
        tag_external_id: &str,
        tag: &Tag,
    ) -> Result<(Tag, Response)> {
        if tag
            .category_external_id
            .as_deref()
            .is_some_and(|c| c != category_external_id)
        {
            return Err(ValidationError::CategoryChanged.into());
        }
        let path = tag_path(category_external_id, tag_external_id);
        let req = self
            .client
            .new_request_segments(HttpMethod::Put, &path)?
            .with_json_body(tag)?;
        self.client.execute(ctx, req)
    }

    pub fn delete_tag(
        &self,
        ctx: &CallContext,
        category_external_id: &str,
        tag_external_id: &str,
    ) -> Result<Response> {
        let req = self.client.new_request_segments(
            HttpMethod::Delete,
            &tag_path(category_external_id, tag_external_id),
        )?;
        self.client.execute_empty(ctx, req)
    }
}

fn tag_path<'s>(category_external_id: &'s str, tag_external_id: &'s str) -> [&'s str; 5] {
    ["tags", "categories", category_external_id, "tags", tag_external_id]
}
