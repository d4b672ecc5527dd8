//! Google Sheets API v4 implementation of `SheetBackend`

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::config::SheetsConfig;
use super::google_auth;
use crate::domain::{BackendError, CellWrite, Grid, SheetBackend, SheetRange, ValidationRule};

pub struct GoogleSheetsBackend {
    http: reqwest::Client,
    config: SheetsConfig,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetMetadata>,
}

#[derive(Debug, Deserialize)]
struct SheetMetadata {
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    #[serde(default)]
    values: Vec<CellData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    data_validation: Option<DataValidation>,
}

#[derive(Debug, Deserialize)]
struct DataValidation {
    condition: Option<BooleanCondition>,
}

#[derive(Debug, Deserialize)]
struct BooleanCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    values: Vec<ConditionValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionValue {
    user_entered_value: Option<String>,
}

fn rule_from_condition(c: BooleanCondition) -> ValidationRule {
    let BooleanCondition { kind, values } = c;
    let mut values = values.into_iter().filter_map(|v| v.user_entered_value);

    if kind == "ONE_OF_LIST" {
        return ValidationRule::OneOfList(values.collect());
    }
    if kind == "ONE_OF_RANGE" {
        if let Some(formula) = values.next() {
            return ValidationRule::OneOfRange(formula);
        }
    }
    ValidationRule::Other(kind)
}

/// Sheets returns typed scalars; the record store works on text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

impl GoogleSheetsBackend {
    pub fn new(config: SheetsConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.spreadsheet_id,
            suffix
        )
    }

    fn values_url(&self, reference: &str, action: &str) -> String {
        self.url(&format!(
            "/values/{}{}",
            urlencoding::encode(reference),
            action
        ))
    }

    /// Authorise and send. A 400 on a request that names `range` means it does not resolve.
    async fn send(
        &self,
        request: RequestBuilder,
        range: Option<&str>,
    ) -> Result<Response, BackendError> {
        let token = google_auth::access_token(&self.http, &self.config).await?;

        let resp = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("Failed to send request: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        if let Some(range) = range {
            if status == StatusCode::BAD_REQUEST || body.contains("Unable to parse range") {
                return Err(BackendError::MissingRange(range.to_string()));
            }
        }

        tracing::error!("Sheets API returned {}: {}", status, body);
        Err(BackendError::Unavailable(format!(
            "Sheets API returned status: {}",
            status
        )))
    }

    /// `values.get` on an A1 range or a named range, formulas unevaluated
    async fn get_values(&self, reference: &str) -> Result<Grid, BackendError> {
        let request = self
            .http
            .get(self.values_url(reference, ""))
            .query(&[("valueRenderOption", "FORMULA")]);

        let resp = self.send(request, Some(reference)).await?;
        let parsed: ValueRange = resp
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("Failed to parse values: {}", e)))?;

        Ok(parsed
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl SheetBackend for GoogleSheetsBackend {
    async fn read_values(&self, range: &SheetRange) -> Result<Grid, BackendError> {
        self.get_values(&range.to_string()).await
    }

    async fn read_named_range(&self, name: &str) -> Result<Grid, BackendError> {
        self.get_values(name).await
    }

    async fn write_cells(&self, writes: &[CellWrite]) -> Result<(), BackendError> {
        if writes.is_empty() {
            return Ok(());
        }

        let data: Vec<Value> = writes
            .iter()
            .map(|w| json!({ "range": w.range().to_string(), "values": [[w.value]] }))
            .collect();

        let request = self
            .http
            .post(self.url("/values:batchUpdate"))
            .json(&json!({ "valueInputOption": "RAW", "data": data }));

        self.send(request, None).await?;
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), BackendError> {
        let last = values.len().saturating_sub(1);
        let range = SheetRange::columns(sheet, 0, last);

        let request = self
            .http
            .post(self.values_url(&range.to_string(), ":append"))
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [values] }));

        self.send(request, None).await?;
        Ok(())
    }

    async fn column_validation(
        &self,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<ValidationRule>, BackendError> {
        let range = SheetRange::column(sheet, column);
        let request = self.http.get(self.url("")).query(&[
            ("includeGridData", "true"),
            ("ranges", range.to_string().as_str()),
            ("fields", "sheets(data(rowData(values(dataValidation))))"),
        ]);

        let resp = self.send(request, Some(&range.to_string())).await?;
        let parsed: SpreadsheetMetadata = resp
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("Failed to parse metadata: {}", e)))?;

        Ok(parsed
            .sheets
            .into_iter()
            .take(1)
            .flat_map(|s| s.data.into_iter().take(1))
            .flat_map(|d| d.row_data)
            .filter_map(|row| row.values.into_iter().next())
            .filter_map(|cell| cell.data_validation)
            .filter_map(|v| v.condition)
            .map(rule_from_condition)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_become_text() {
        assert_eq!(cell_text(&json!("Shelf A")), "Shelf A");
        assert_eq!(cell_text(&json!(9780140449136u64)), "9780140449136");
        assert_eq!(cell_text(&json!(true)), "TRUE");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn conditions_map_to_rules() {
        let list: BooleanCondition = serde_json::from_value(json!({
            "type": "ONE_OF_LIST",
            "values": [{ "userEnteredValue": "Living Room" }, { "userEnteredValue": "Kitchen" }]
        }))
        .unwrap();
        assert_eq!(
            rule_from_condition(list),
            ValidationRule::OneOfList(vec!["Living Room".into(), "Kitchen".into()])
        );

        let range: BooleanCondition = serde_json::from_value(json!({
            "type": "ONE_OF_RANGE",
            "values": [{ "userEnteredValue": "=Locations!A2:A" }]
        }))
        .unwrap();
        assert_eq!(
            rule_from_condition(range),
            ValidationRule::OneOfRange("=Locations!A2:A".into())
        );

        let other: BooleanCondition =
            serde_json::from_value(json!({ "type": "BOOLEAN" })).unwrap();
        assert_eq!(rule_from_condition(other), ValidationRule::Other("BOOLEAN".into()));
    }
}
