//! Thin client over the spreadsheet and drive REST APIs.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::auth::AccessTokenProvider;
use super::error::SheetsError;

/// Identifiers of a freshly created spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSpreadsheet {
    pub spreadsheet_id: String,
    /// Numeric id of the first tab, needed for formatting ranges
    pub sheet_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    spreadsheet_id: String,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
}

#[derive(Debug, Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

/// Authenticated API client.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    sheets_base_url: String,
    drive_base_url: String,
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<dyn AccessTokenProvider>,
        sheets_base_url: impl Into<String>,
        drive_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            sheets_base_url: sheets_base_url.into().trim_end_matches('/').to_string(),
            drive_base_url: drive_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a spreadsheet with the given title.
    pub async fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .post(format!("{}/spreadsheets", self.sheets_base_url))
            .bearer_auth(token)
            .json(&json!({ "properties": { "title": title } }))
            .send()
            .await?;
        let response = check_status(response, "create spreadsheet").await?;

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|_| SheetsError::UnexpectedResponse("create spreadsheet"))?;
        let sheet_id = created
            .sheets
            .first()
            .map(|s| s.properties.sheet_id)
            .unwrap_or(0);

        Ok(CreatedSpreadsheet {
            spreadsheet_id: created.spreadsheet_id,
            sheet_id,
        })
    }

    /// Move a file under `folder_id`, detaching it from its current parents.
    pub async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<(), SheetsError> {
        let token = self.auth.access_token().await?;
        let file_url = format!("{}/files/{}", self.drive_base_url, file_id);

        let response = self
            .http
            .get(&file_url)
            .bearer_auth(&token)
            .query(&[("fields", "parents"), ("supportsAllDrives", "true")])
            .send()
            .await?;
        let response = check_status(response, "read file parents").await?;
        let current: FileParents = response
            .json()
            .await
            .map_err(|_| SheetsError::UnexpectedResponse("read file parents"))?;
        let remove = current.parents.join(",");

        let response = self
            .http
            .patch(&file_url)
            .bearer_auth(&token)
            .query(&[
                ("addParents", folder_id),
                ("removeParents", remove.as_str()),
                ("supportsAllDrives", "true"),
                ("fields", "id,parents"),
            ])
            .json(&json!({}))
            .send()
            .await?;
        check_status(response, "move to folder").await?;
        Ok(())
    }

    /// Write a block of raw values.
    pub async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .put(format!(
                "{}/spreadsheets/{}/values/{}",
                self.sheets_base_url, spreadsheet_id, range
            ))
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": values,
            }))
            .send()
            .await?;
        check_status(response, "write values").await?;
        Ok(())
    }

    /// Apply structural/format requests in one call.
    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Value>,
    ) -> Result<(), SheetsError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .post(format!(
                "{}/spreadsheets/{}:batchUpdate",
                self.sheets_base_url, spreadsheet_id
            ))
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        check_status(response, "batch update").await?;
        Ok(())
    }
}

async fn check_status(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SheetsError::Api {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Viewer URL for a spreadsheet id.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit", spreadsheet_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_url() {
        assert_eq!(
            spreadsheet_url("1AbC"),
            "https://docs.google.com/spreadsheets/d/1AbC/edit"
        );
    }

    #[test]
    fn test_create_response_shape() {
        let body = r#"{"spreadsheetId": "xyz", "sheets": [{"properties": {"sheetId": 7, "title": "Sheet1"}}]}"#;
        let parsed: CreateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.spreadsheet_id, "xyz");
        assert_eq!(parsed.sheets[0].properties.sheet_id, 7);
    }
}
