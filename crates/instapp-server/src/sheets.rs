//! Google Sheets and Drive over HTTP.

use instapp_core::GridRange;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccountKey;
use crate::error::AppError;
use crate::retry::RetryPolicy;
use crate::store::{
    cell_to_string, SheetProperties, SheetStore, SpreadsheetFile, SpreadsheetMetadata,
    ValueRange, ValueRenderOption,
};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_QUERY: &str =
    "mimeType='application/vnd.google-apps.spreadsheet' and trashed=false";
const READ_JITTER: Duration = Duration::from_millis(1000);

/// Map a non-success response status to an error kind.
pub fn classify_status(status: StatusCode, op: &str, body: &str) -> AppError {
    match status.as_u16() {
        401 => AppError::Connection(format!(
            "{op}: authentication failed, check service account credentials"
        )),
        403 => AppError::PermissionDenied(format!(
            "{op}: check that the spreadsheet is shared with the service account"
        )),
        404 => AppError::NotFound(format!("{op}: check the spreadsheet ID and range")),
        429 | 500..=599 => AppError::TransientNetwork(format!("{op}: {status} {body}")),
        _ => AppError::Internal(format!("{op}: {status} {body}")),
    }
}

async fn check_status(op: &str, resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(status, op, &body))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<SpreadsheetFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SpreadsheetTitle {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    properties: SpreadsheetTitle,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct Values {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets v4 and Drive v3 client authenticated as a service account.
///
/// Reads carry a timeout and jittered retries; writes retry without jitter.
pub struct SheetsClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    read_retry: RetryPolicy,
    write_retry: RetryPolicy,
    read_timeout: Duration,
}

impl SheetsClient {
    pub fn new(
        key: ServiceAccountKey,
        retry: RetryPolicy,
        read_timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("instapp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            tokens: TokenProvider::new(key),
            read_retry: retry.clone().with_jitter(READ_JITTER),
            write_retry: retry,
            read_timeout,
        })
    }

    pub fn client_email(&self) -> &str {
        self.tokens.client_email()
    }

    /// Fetch an access token to prove the credential works.
    pub async fn check_connection(&self) -> Result<(), AppError> {
        self.tokens.token(&self.http).await.map(|_| ())
    }

    fn url(&self, base: &str, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(base).map_err(|e| AppError::Internal(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(format!("cannot extend {base}")))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, op: &str, request: RequestBuilder) -> Result<Response, AppError> {
        let token = self.tokens.token(&self.http).await?;
        let resp = request.bearer_auth(token).send().await?;
        check_status(op, resp).await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        op: &str,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let resp = self
            .read_retry
            .run(op, AppError::is_transient, move || {
                let request = self
                    .http
                    .get(url.clone())
                    .query(query)
                    .timeout(self.read_timeout);
                self.send(op, request)
            })
            .await?;
        Ok(resp.json().await?)
    }

    async fn write_json(
        &self,
        op: &str,
        method: reqwest::Method,
        url: &Url,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<(), AppError> {
        self.write_retry
            .run(op, AppError::is_transient, move || {
                let request = self
                    .http
                    .request(method.clone(), url.clone())
                    .query(query)
                    .json(body);
                self.send(op, request)
            })
            .await?;
        Ok(())
    }
}

impl SheetStore for SheetsClient {
    async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetFile>, AppError> {
        let url = self.url(DRIVE_FILES_API, &[])?;
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: FileList = {
                let mut query = vec![
                    ("q", SPREADSHEET_QUERY),
                    ("fields", "nextPageToken, files(id, name)"),
                    ("includeItemsFromAllDrives", "true"),
                    ("supportsAllDrives", "true"),
                    ("pageSize", "1000"),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                self.read_json("list spreadsheets", &url, &query).await?
            };
            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::info!(count = files.len(), "Listed spreadsheets");
        Ok(files)
    }

    async fn metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetMetadata, AppError> {
        let url = self.url(SHEETS_API, &[spreadsheet_id])?;
        let raw: Spreadsheet = self
            .read_json(
                "get spreadsheet metadata",
                &url,
                &[("fields", "spreadsheetId,properties.title,sheets.properties")],
            )
            .await?;

        Ok(SpreadsheetMetadata {
            spreadsheet_id: raw.spreadsheet_id,
            title: raw.properties.title,
            sheets: raw.sheets.into_iter().map(|s| s.properties).collect(),
        })
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let url = self.url(SHEETS_API, &[spreadsheet_id, "values", range])?;
        let raw: Values = self
            .read_json(
                "read spreadsheet",
                &url,
                &[
                    ("valueRenderOption", render.as_str()),
                    ("majorDimension", "ROWS"),
                ],
            )
            .await?;

        tracing::debug!(range, rows = raw.values.len(), "Read values");
        Ok(raw
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), AppError> {
        let url = self.url(SHEETS_API, &[spreadsheet_id, "values", range])?;
        let rows = values.len();
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        self.write_json(
            "write spreadsheet",
            reqwest::Method::PUT,
            &url,
            &[("valueInputOption", "USER_ENTERED")],
            &body,
        )
        .await?;

        tracing::info!(range, rows, "Wrote values");
        Ok(())
    }

    async fn batch_write(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), AppError> {
        if data.is_empty() {
            return Ok(());
        }
        let url = self.url(SHEETS_API, &[spreadsheet_id, "values:batchUpdate"])?;
        let ranges = data.len();
        let body = json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });
        self.write_json("batch update values", reqwest::Method::POST, &url, &[], &body)
            .await?;

        tracing::info!(ranges, "Batch wrote values");
        Ok(())
    }

    async fn copy_format(
        &self,
        spreadsheet_id: &str,
        source: GridRange,
        destination: GridRange,
    ) -> Result<(), AppError> {
        let endpoint = format!("{spreadsheet_id}:batchUpdate");
        let url = self.url(SHEETS_API, &[endpoint.as_str()])?;
        let body = json!({
            "requests": [{
                "copyPaste": {
                    "source": source,
                    "destination": destination,
                    "pasteType": "PASTE_FORMAT",
                }
            }]
        });
        self.write_json("copy row format", reqwest::Method::POST, &url, &[], &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        let classify = |code: u16| classify_status(StatusCode::from_u16(code).unwrap(), "read", "");
        assert!(matches!(classify(401), AppError::Connection(_)));
        assert!(matches!(classify(403), AppError::PermissionDenied(_)));
        assert!(matches!(classify(404), AppError::NotFound(_)));
        assert!(classify(429).is_transient());
        assert!(classify(503).is_transient());
        assert!(matches!(classify(400), AppError::Internal(_)));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let key: ServiceAccountKey =
            serde_json::from_value(crate::credentials::tests::sample_key_json()).unwrap();
        let client =
            SheetsClient::new(key, RetryPolicy::default(), Duration::from_secs(30)).unwrap();

        let url = client
            .url(SHEETS_API, &["abc", "values", "'My Sheet'!A2:D2"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'My%20Sheet'!A2:D2"
        );
    }
}
