//! Forecast data, rules and predictions.
//!
//! # Design
//! Every method validates its options before touching the network:
//! unit-scoped calls require `RequestOptions::external_unit_id`,
//! range queries additionally require both bounds and a span of at most
//! `MAX_DAYS_RANGE` days, and uploads carry at most `MAX_ROWS_PER_CALL`
//! rows. Options are sent as query parameters; payloads as JSON bodies.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Response};
use crate::error::Result;
use crate::http::{CallContext, HttpMethod, HttpRequest};
use crate::options::{
    check_batch_size, RequestOptions, RequestRangeOptions, UploadParams, Validate,
};
use crate::query::{encode, to_query_string};
use crate::timestamp::Timestamp;

/// Rows of actual or budget data (`requests` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataProviderInputList {
    #[serde(rename = "requests")]
    pub data_provider_inputs: Vec<DataProviderInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedDataInputList {
    #[serde(rename = "requests")]
    pub forecast_predictions: Vec<ForecastPrediction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_forecast_variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_forecast_configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timestamp: Option<Timestamp>,
    #[serde(rename = "forecastDataPayload", default)]
    pub payloads: Vec<Payload>,
}

/// One row of uploaded data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProviderInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_forecast_variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_section_id: Option<String>,
    #[serde(rename = "forecastDataPayload", default, skip_serializing_if = "Vec::is_empty")]
    pub data_payload: Vec<Payload>,
}

/// Data as returned by the API; note `dataPayload` instead of
/// `forecastDataPayload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_forecast_variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_payload: Vec<Payload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedForecast {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_payload: Vec<CalculatedPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_forecast_configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_unit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_data: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
}

/// Manual edit of a calculated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCalculatedRequest {
    pub repetition_setup: bool,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub percentage_modification: f64,
    pub new_value_for_period: f64,
    #[serde(rename = "weekdays")]
    pub week_days: Vec<Weekday>,
    pub repetition_end_date: Timestamp,
    pub week_pattern: i32,
}

/// Day of week, encoded as `"0"` (Monday) through `"6"` (Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "0")]
    Monday,
    #[serde(rename = "1")]
    Tuesday,
    #[serde(rename = "2")]
    Wednesday,
    #[serde(rename = "3")]
    Thursday,
    #[serde(rename = "4")]
    Friday,
    #[serde(rename = "5")]
    Saturday,
    #[serde(rename = "6")]
    Sunday,
}

/// Staffing rule driven by a forecast variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRule {
    pub amount: i64,
    pub end_time: LocalTime,
    pub start_time: LocalTime,
    pub external_id: String,
    #[serde(rename = "forecastExternalVariableId")]
    pub external_forecast_variable_id: String,
    pub shift_types: Vec<ShiftType>,
    pub weekdays: Vec<Weekday>,
}

/// Fixed staffing rule over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRule {
    pub comment: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub start_time: LocalTime,
    pub end_time: LocalTime,
    pub external_id: String,
    pub repeat_period: i32,
    pub shift_type: ShiftType,
    pub weekdays: Vec<Weekday>,
}

/// Wall-clock time of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    pub hour: i32,
    pub minute: i32,
    pub nano: i32,
    pub second: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
    pub amount: i32,
    #[serde(rename = "externalShiftTypeId")]
    pub shift_type_id: String,
}

const DYNAMIC_RULES: &str = "forecasts/dynamic-rules";
const STATIC_RULES: &str = "forecasts/static-rules";

/// Forecast endpoints, obtained from `Client::forecast`.
#[derive(Debug, Clone, Copy)]
pub struct ForecastService<'a> {
    client: &'a Client,
}

impl<'a> ForecastService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    pub fn get_dynamic_rules(
        &self,
        ctx: &CallContext,
        options: &RequestOptions,
    ) -> Result<(Vec<DynamicRule>, Response)> {
        let req = self.unit_request(HttpMethod::Get, DYNAMIC_RULES, options)?;
        self.client.execute(ctx, req)
    }

    pub fn get_static_rules(
        &self,
        ctx: &CallContext,
        options: &RequestOptions,
    ) -> Result<(Vec<StaticRule>, Response)> {
        let req = self.unit_request(HttpMethod::Get, STATIC_RULES, options)?;
        self.client.execute(ctx, req)
    }

    pub fn create_dynamic_rule(
        &self,
        ctx: &CallContext,
        rule: &DynamicRule,
        options: &RequestOptions,
    ) -> Result<(DynamicRule, Response)> {
        let req = self
            .unit_request(HttpMethod::Post, DYNAMIC_RULES, options)?
            .with_json_body(rule)?;
        self.client.execute(ctx, req)
    }

    pub fn create_static_rule(
        &self,
        ctx: &CallContext,
        rule: &StaticRule,
        options: &RequestOptions,
    ) -> Result<(StaticRule, Response)> {
        let req = self
            .unit_request(HttpMethod::Post, STATIC_RULES, options)?
            .with_json_body(rule)?;
        self.client.execute(ctx, req)
    }

    pub fn update_dynamic_rule(
        &self,
        ctx: &CallContext,
        rule: &DynamicRule,
        options: &RequestOptions,
    ) -> Result<Response> {
        let req = self
            .unit_request(HttpMethod::Put, DYNAMIC_RULES, options)?
            .with_json_body(rule)?;
        self.client.execute_empty(ctx, req)
    }

    pub fn update_static_rule(
        &self,
        ctx: &CallContext,
        rule: &StaticRule,
        options: &RequestOptions,
    ) -> Result<Response> {
        let req = self
            .unit_request(HttpMethod::Put, STATIC_RULES, options)?
            .with_json_body(rule)?;
        self.client.execute_empty(ctx, req)
    }

    pub fn delete_dynamic_rule(
        &self,
        ctx: &CallContext,
        dynamic_rule_id: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let req = self.delete_rule_request(
            DYNAMIC_RULES,
            "externalDynamicRuleId",
            dynamic_rule_id,
            options,
        )?;
        self.client.execute_empty(ctx, req)
    }

    pub fn delete_static_rule(
        &self,
        ctx: &CallContext,
        static_rule_id: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let req = self.delete_rule_request(
            STATIC_RULES,
            "externalStaticRuleId",
            static_rule_id,
            options,
        )?;
        self.client.execute_empty(ctx, req)
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Upload raw data points. `append_data` adds to existing data instead
    /// of replacing it.
    pub fn upload_actual_data(
        &self,
        ctx: &CallContext,
        append_data: bool,
        rows: &DataProviderInputList,
    ) -> Result<Response> {
        let req = self.upload_request("forecasts/actual-data", append_data, rows)?;
        self.client.execute_empty(ctx, req)
    }

    pub fn upload_budget_data(
        &self,
        ctx: &CallContext,
        append_data: bool,
        rows: &DataProviderInputList,
    ) -> Result<Response> {
        let req = self.upload_request("forecasts/budget-data", append_data, rows)?;
        self.client.execute_empty(ctx, req)
    }

    /// Upload generated predictions. Data point resolution must match the
    /// variable's resolution.
    pub fn upload_predicted_data(
        &self,
        ctx: &CallContext,
        predictions: &PredictedDataInputList,
    ) -> Result<Response> {
        check_batch_size(predictions.forecast_predictions.len())?;
        let req = self
            .client
            .new_request(HttpMethod::Post, "forecasts/predicted-data")?
            .with_json_body(predictions)?;
        self.client.execute_empty(ctx, req)
    }

    // -----------------------------------------------------------------------
    // Range queries
    // -----------------------------------------------------------------------

    pub fn get_actual_data(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<(Vec<DataProvider>, Response)> {
        let req =
            self.range_request(HttpMethod::Get, forecast_variable_id, "actual-data", options)?;
        self.client.execute(ctx, req)
    }

    /// Also deletes the calculated forecast derived from the data. Bounds
    /// must be at the start of an hour.
    pub fn delete_actual_data(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<Response> {
        let req = self.range_request(
            HttpMethod::Delete,
            forecast_variable_id,
            "actual-data",
            options,
        )?;
        self.client.execute_empty(ctx, req)
    }

    pub fn get_actual_data_stream(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<(Vec<DataProvider>, Response)> {
        let req = self.range_request(
            HttpMethod::Get,
            forecast_variable_id,
            "actual-data-stream",
            options,
        )?;
        self.client.execute(ctx, req)
    }

    pub fn get_aggregated_data(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<(Vec<AggregatedPayload>, Response)> {
        let req = self.range_request(
            HttpMethod::Get,
            forecast_variable_id,
            "aggregated-data",
            options,
        )?;
        self.client.execute(ctx, req)
    }

    pub fn get_calculated_forecast(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<(Vec<CalculatedForecast>, Response)> {
        let req = self.range_request(
            HttpMethod::Get,
            forecast_variable_id,
            "calculated-forecast",
            options,
        )?;
        self.client.execute(ctx, req)
    }

    pub fn edit_calculated_forecast(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        forecast_configuration_id: &str,
        options: &RequestOptions,
        edit: &EditCalculatedRequest,
    ) -> Result<Response> {
        options.validate().into_result()?;
        let query = to_query_string(&encode(options));
        let req = self
            .client
            .new_request_segments(
                HttpMethod::Post,
                &[
                    "forecasts",
                    "forecast-variables",
                    forecast_variable_id,
                    "forecast-configurations",
                    forecast_configuration_id,
                    "edit-forecast",
                ],
            )?
            .with_query(&query)
            .with_json_body(edit)?;
        self.client.execute_empty(ctx, req)
    }

    pub fn get_forecast_data(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<(Vec<DataProvider>, Response)> {
        let req =
            self.range_request(HttpMethod::Get, forecast_variable_id, "forecast-data", options)?;
        self.client.execute(ctx, req)
    }

    pub fn delete_forecast_data(
        &self,
        ctx: &CallContext,
        forecast_variable_id: &str,
        options: &RequestRangeOptions,
    ) -> Result<Response> {
        let req = self.range_request(
            HttpMethod::Delete,
            forecast_variable_id,
            "forecast-data",
            options,
        )?;
        self.client.execute_empty(ctx, req)
    }

    // -----------------------------------------------------------------------
    // Request helpers
    // -----------------------------------------------------------------------

    fn unit_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest> {
        options.validate().into_result()?;
        let query = to_query_string(&encode(options));
        Ok(self.client.new_request(method, path)?.with_query(&query))
    }

    fn delete_rule_request(
        &self,
        path: &str,
        id_key: &'static str,
        rule_id: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest> {
        options.validate().into_result()?;
        let mut pairs = vec![(id_key, rule_id.to_string())];
        pairs.extend(encode(options));
        let query = to_query_string(&pairs);
        Ok(self
            .client
            .new_request(HttpMethod::Delete, path)?
            .with_query(&query))
    }

    fn range_request(
        &self,
        method: HttpMethod,
        forecast_variable_id: &str,
        resource: &str,
        options: &RequestRangeOptions,
    ) -> Result<HttpRequest> {
        options.check_range()?;
        let query = to_query_string(&encode(options));
        let segments = ["forecasts", "forecast-variables", forecast_variable_id, resource];
        Ok(self
            .client
            .new_request_segments(method, &segments)?
            .with_query(&query))
    }

    fn upload_request(
        &self,
        path: &str,
        append_data: bool,
        rows: &DataProviderInputList,
    ) -> Result<HttpRequest> {
        check_batch_size(rows.data_provider_inputs.len())?;
        let query = to_query_string(&encode(&UploadParams { append_data }));
        self.client
            .new_request(HttpMethod::Post, path)?
            .with_query(&query)
            .with_json_body(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};
    use crate::options::MAX_ROWS_PER_CALL;
    use crate::test_utils::{client_with, ctx, StubTransport, TEST_UID};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap() + chrono::Duration::milliseconds(520)
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        Timestamp::new(utc(y, mo, d, h, mi, s))
    }

    fn range() -> RequestRangeOptions {
        RequestRangeOptions::new("d", utc(2019, 10, 12, 7, 20, 50), utc(2019, 10, 13, 7, 20, 50))
    }

    fn rows(n: usize) -> DataProviderInputList {
        let row = DataProviderInput {
            external_forecast_variable_id: Some("a".to_string()),
            external_unit_id: Some("c".to_string()),
            external_section_id: Some("b".to_string()),
            data_payload: vec![Payload {
                data: Some(123.0),
                timestamp: Some(ts(2019, 10, 12, 7, 20, 50)),
            }],
        };
        DataProviderInputList {
            data_provider_inputs: vec![row; n],
        }
    }

    fn body_json(stub: &StubTransport) -> serde_json::Value {
        serde_json::from_str(stub.last_request().body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn upload_actual_data_body_and_query() {
        let stub = StubTransport::json(200, "");
        let client = client_with(&stub);
        let resp = client.forecast().upload_actual_data(&ctx(), false, &rows(1)).unwrap();
        assert_eq!(resp.request_uid, TEST_UID);

        let req = stub.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url.path(), "/v2/forecasts/actual-data");
        assert_eq!(stub.last_query("appendData").as_deref(), Some("false"));
        assert_eq!(
            body_json(&stub),
            json!({"requests": [{
                "externalForecastVariableId": "a",
                "externalUnitId": "c",
                "externalSectionId": "b",
                "forecastDataPayload": [{"data": 123.0, "timestamp": "2019-10-12T07:20:50.52Z"}]
            }]})
        );
    }

    #[test]
    fn upload_budget_data_appends() {
        let stub = StubTransport::json(200, "");
        let client = client_with(&stub);
        client.forecast().upload_budget_data(&ctx(), true, &rows(2)).unwrap();
        assert_eq!(stub.last_request().url.path(), "/v2/forecasts/budget-data");
        assert_eq!(stub.last_query("appendData").as_deref(), Some("true"));
    }

    #[test]
    fn uploads_enforce_row_limit_before_sending() {
        let stub = StubTransport::json(200, "");
        let client = client_with(&stub);

        client
            .forecast()
            .upload_actual_data(&ctx(), false, &rows(MAX_ROWS_PER_CALL))
            .unwrap();
        assert_eq!(stub.requests().len(), 1);

        let err = client
            .forecast()
            .upload_actual_data(&ctx(), false, &rows(MAX_ROWS_PER_CALL + 1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooManyRows { rows: 367, max: 366 })
        ));

        let predictions = PredictedDataInputList {
            forecast_predictions: vec![ForecastPrediction::default(); MAX_ROWS_PER_CALL + 1],
        };
        let err = client
            .forecast()
            .upload_predicted_data(&ctx(), &predictions)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::TooManyRows { .. })));
        assert_eq!(stub.requests().len(), 1, "rejected uploads are never sent");
    }

    #[test]
    fn upload_predicted_data_body() {
        let stub = StubTransport::json(200, "");
        let client = client_with(&stub);
        let predictions = PredictedDataInputList {
            forecast_predictions: vec![ForecastPrediction {
                external_forecast_variable_id: Some("a".to_string()),
                external_forecast_configuration_id: Some("d".to_string()),
                external_unit_id: Some("c".to_string()),
                external_section_id: Some("b".to_string()),
                run_identifier: Some("e".to_string()),
                run_timestamp: Some(ts(2020, 10, 12, 7, 20, 50)),
                payloads: vec![Payload {
                    data: Some(123.0),
                    timestamp: Some(ts(2019, 10, 12, 7, 20, 50)),
                }],
            }],
        };
        client.forecast().upload_predicted_data(&ctx(), &predictions).unwrap();
        assert_eq!(stub.last_request().url.path(), "/v2/forecasts/predicted-data");
        assert_eq!(stub.last_request().url.query(), None);
        assert_eq!(
            body_json(&stub),
            json!({"requests": [{
                "externalForecastVariableId": "a",
                "externalForecastConfigurationId": "d",
                "externalUnitId": "c",
                "externalSectionId": "b",
                "runIdentifier": "e",
                "runTimestamp": "2020-10-12T07:20:50.52Z",
                "forecastDataPayload": [{"data": 123.0, "timestamp": "2019-10-12T07:20:50.52Z"}]
            }]})
        );
    }

    #[test]
    fn get_actual_data_query_and_decode() {
        let stub = StubTransport::json(
            200,
            r#"[{"externalForecastVariableId":"b","externalSectionId":"c","externalUnitId":"d",
                "dataPayload":[{"data":123,"timestamp":"2019-10-12T07:20:50.52Z"}]}]"#,
        );
        let client = client_with(&stub);
        let (data, _) = client.forecast().get_actual_data(&ctx(), "a", &range()).unwrap();

        assert_eq!(
            stub.last_request().url.path(),
            "/v2/forecasts/forecast-variables/a/actual-data"
        );
        assert_eq!(stub.last_query("startTime").as_deref(), Some("2019-10-12T07:20:50Z"));
        assert_eq!(stub.last_query("endTime").as_deref(), Some("2019-10-13T07:20:50Z"));
        assert_eq!(stub.last_query("externalUnitId").as_deref(), Some("d"));
        assert_eq!(stub.last_query("externalSectionId"), None);
        assert_eq!(
            data,
            vec![DataProvider {
                external_forecast_variable_id: Some("b".to_string()),
                external_unit_id: Some("d".to_string()),
                external_section_id: Some("c".to_string()),
                data_payload: vec![Payload {
                    data: Some(123.0),
                    timestamp: Some(ts(2019, 10, 12, 7, 20, 50)),
                }],
            }]
        );
    }

    #[test]
    fn section_is_sent_when_set() {
        let stub = StubTransport::json(200, "[]");
        let client = client_with(&stub);
        let options = range().with_section("foo");
        client.forecast().get_forecast_data(&ctx(), "a", &options).unwrap();
        assert_eq!(stub.last_query("externalSectionId").as_deref(), Some("foo"));
    }

    #[test]
    fn range_queries_reject_incomplete_or_wide_options() {
        let stub = StubTransport::json(200, "[]");
        let client = client_with(&stub);
        let forecast = client.forecast();

        let err = forecast
            .get_actual_data(&ctx(), "a", &RequestRangeOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("required fields"));

        let wide = RequestRangeOptions::new(
            "d",
            utc(2019, 7, 12, 7, 20, 50),
            utc(2019, 12, 17, 12, 20, 50),
        );
        for result in [
            forecast.get_aggregated_data(&ctx(), "a", &wide).map(|_| ()),
            forecast.get_calculated_forecast(&ctx(), "a", &wide).map(|_| ()),
            forecast.get_actual_data_stream(&ctx(), "a", &wide).map(|_| ()),
            forecast.delete_forecast_data(&ctx(), "a", &wide).map(|_| ()),
            forecast.delete_actual_data(&ctx(), "a", &wide).map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(Error::Validation(ValidationError::DateRangeTooWide { .. }))
            ));
        }
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn aggregated_and_calculated_decode() {
        let stub = StubTransport::json(
            200,
            r#"[{"data":1234,"startTime":"2019-10-12T07:20:50.52Z","endTime":1570864910}]"#,
        );
        let client = client_with(&stub);
        let (agg, _) = client.forecast().get_aggregated_data(&ctx(), "a", &range()).unwrap();
        assert_eq!(agg[0].data, Some(1234.0));
        assert_eq!(agg[0].end_time, Some(Timestamp::decode("1570864910").unwrap()));

        let stub = StubTransport::json(
            200,
            r#"[{"dataPayload":[{"data":1234,"editedData":4321}],
                "externalForecastConfigurationId":"b"}]"#,
        );
        let client = client_with(&stub);
        let (calc, _) = client
            .forecast()
            .get_calculated_forecast(&ctx(), "a", &range())
            .unwrap();
        assert_eq!(
            stub.last_request().url.path(),
            "/v2/forecasts/forecast-variables/a/calculated-forecast"
        );
        assert_eq!(calc[0].data_payload[0].edited_data, Some(4321.0));
    }

    #[test]
    fn delete_actual_data_uses_delete() {
        let stub = StubTransport::json(204, "");
        let client = client_with(&stub);
        let resp = client.forecast().delete_actual_data(&ctx(), "a", &range()).unwrap();
        assert_eq!(resp.status, 204);
        let req = stub.last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn edit_calculated_forecast() {
        let stub = StubTransport::json(200, "");
        let client = client_with(&stub);
        let edit = EditCalculatedRequest {
            repetition_setup: true,
            start_time: ts(2019, 10, 12, 7, 20, 50),
            end_time: ts(2019, 10, 12, 7, 21, 50),
            percentage_modification: 1234.0,
            new_value_for_period: 4321.0,
            week_days: vec![Weekday::Wednesday],
            repetition_end_date: ts(2019, 10, 12, 7, 22, 50),
            week_pattern: 1,
        };
        client
            .forecast()
            .edit_calculated_forecast(&ctx(), "a", "b", &RequestOptions::for_unit("d"), &edit)
            .unwrap();

        assert_eq!(
            stub.last_request().url.path(),
            "/v2/forecasts/forecast-variables/a/forecast-configurations/b/edit-forecast"
        );
        assert_eq!(stub.last_query("externalUnitId").as_deref(), Some("d"));
        assert_eq!(
            body_json(&stub),
            json!({
                "repetitionSetup": true,
                "startTime": "2019-10-12T07:20:50.52Z",
                "endTime": "2019-10-12T07:21:50.52Z",
                "percentageModification": 1234.0,
                "newValueForPeriod": 4321.0,
                "weekdays": ["2"],
                "repetitionEndDate": "2019-10-12T07:22:50.52Z",
                "weekPattern": 1
            })
        );
    }

    #[test]
    fn variable_id_cannot_escape_its_path() {
        let stub = StubTransport::json(200, "[]");
        let client = client_with(&stub);
        client
            .forecast()
            .get_forecast_data(&ctx(), "v?x=1", &range())
            .unwrap();
        assert_eq!(
            stub.last_request().url.path(),
            "/v2/forecasts/forecast-variables/v%3Fx=1/forecast-data"
        );
        assert_eq!(stub.last_query("x"), None);

        let err = client
            .forecast()
            .get_actual_data(&ctx(), "..", &range())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert_eq!(stub.requests().len(), 1);
    }

    #[test]
    fn rules_require_unit() {
        let stub = StubTransport::json(200, "[]");
        let client = client_with(&stub);
        let err = client
            .forecast()
            .get_dynamic_rules(&ctx(), &RequestOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::RequiredFieldsMissing)));
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn dynamic_rule_round_trip_shape() {
        let rule = DynamicRule {
            amount: 2,
            end_time: LocalTime { hour: 17, ..Default::default() },
            start_time: LocalTime { hour: 9, ..Default::default() },
            external_id: "r1".to_string(),
            external_forecast_variable_id: "a".to_string(),
            shift_types: vec![ShiftType { amount: 1, shift_type_id: "st".to_string() }],
            weekdays: vec![Weekday::Monday, Weekday::Sunday],
        };
        let body = serde_json::to_string(&rule).unwrap();
        let stub = StubTransport::json(201, &body);
        let client = client_with(&stub);
        let (created, _) = client
            .forecast()
            .create_dynamic_rule(&ctx(), &rule, &RequestOptions::for_unit("d"))
            .unwrap();
        assert_eq!(created, rule);
        let sent = body_json(&stub);
        assert_eq!(sent["forecastExternalVariableId"], "a");
        assert_eq!(sent["shiftTypes"][0]["externalShiftTypeId"], "st");
        assert_eq!(sent["weekdays"], json!(["0", "6"]));
    }

    #[test]
    fn static_rules_list_and_update() {
        let stub = StubTransport::json(
            200,
            r#"[{"comment":"c","startDate":"2019-10-12T00:00:00Z","endDate":"2019-11-12T00:00:00Z",
                "startTime":{"hour":8,"minute":0,"nano":0,"second":0},
                "endTime":{"hour":16,"minute":30,"nano":0,"second":0},
                "externalId":"s1","repeatPeriod":1,
                "shiftType":{"amount":3,"externalShiftTypeId":"st"},"weekdays":["4"]}]"#,
        );
        let client = client_with(&stub);
        let options = RequestOptions::for_unit("d");
        let (rules, _) = client.forecast().get_static_rules(&ctx(), &options).unwrap();
        assert_eq!(rules[0].end_time.minute, 30);
        assert_eq!(rules[0].weekdays, vec![Weekday::Friday]);
        assert_eq!(stub.last_request().url.path(), "/v2/forecasts/static-rules");

        client.forecast().update_static_rule(&ctx(), &rules[0], &options).unwrap();
        assert_eq!(stub.last_request().method, HttpMethod::Put);
    }

    #[test]
    fn delete_rules_put_rule_id_first() {
        let stub = StubTransport::json(204, "");
        let client = client_with(&stub);
        let options = RequestOptions::for_unit("d").with_section("s");

        client.forecast().delete_dynamic_rule(&ctx(), "r1", &options).unwrap();
        assert_eq!(
            stub.last_request().url.query(),
            Some("externalDynamicRuleId=r1&externalSectionId=s&externalUnitId=d")
        );

        client.forecast().delete_static_rule(&ctx(), "s1", &options).unwrap();
        assert_eq!(stub.last_query("externalStaticRuleId").as_deref(), Some("s1"));
        assert_eq!(stub.last_request().url.path(), "/v2/forecasts/static-rules");
    }

    #[test]
    fn unknown_weekday_is_a_decode_error() {
        let stub = StubTransport::json(
            200,
            r#"[{"amount":1,"endTime":{"hour":0,"minute":0,"nano":0,"second":0},
            "startTime":{"hour":0,"minute":0,"nano":0,"second":0},"externalId":"x",
            "forecastExternalVariableId":"a","shiftTypes":[],"weekdays":["7"]}]"#,
        );
        let client = client_with(&stub);
        let err = client
            .forecast()
            .get_dynamic_rules(&ctx(), &RequestOptions::for_unit("d"))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
