//! Thin clients for the Google Drive v3 and Sheets v4 REST APIs.

use anyhow::{Context, Error};
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::CONTENT_TYPE,
    Url,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    sheet::{TabContent, TabSink},
    source::{ReportSource, SourceFile},
    Result,
};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const CSV_MIME: &str = "text/csv";
const UPLOAD_BOUNDARY: &str = "yt_revenue_ledger_boundary";

fn check(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::msg(format!("{what} failed with {status}: {body}")))
}

#[derive(Debug, Clone)]
struct Session {
    client: Client,
    token: String,
}

impl Session {
    fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
        }
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url).bearer_auth(&self.token)
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url).bearer_auth(&self.token)
    }

    fn put(&self, url: Url) -> RequestBuilder {
        self.client.put(url).bearer_auth(&self.token)
    }
}

/// Builds `base/seg1/seg2...`, percent-encoding each segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| Error::msg(format!("cannot extend {base}")))?
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

/// CSV exports stored in one Google Drive folder.
#[derive(Debug, Clone)]
pub struct DriveFolder {
    session: Session,
    folder_id: String,
}

impl DriveFolder {
    pub fn new(token: &str, folder_id: &str) -> Self {
        Self {
            session: Session::new(token),
            folder_id: folder_id.to_string(),
        }
    }

    /// Uploads `content` as a new CSV file inside the folder.
    pub fn upload_csv(&self, name: &str, content: &[u8]) -> Result<String> {
        let metadata = json!({
            "name": name,
            "mimeType": CSV_MIME,
            "parents": [self.folder_id],
        });
        let mut body = Vec::with_capacity(content.len() + 512);
        body.extend_from_slice(
            format!(
                "--{UPLOAD_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
                 --{UPLOAD_BOUNDARY}\r\nContent-Type: {CSV_MIME}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{UPLOAD_BOUNDARY}--\r\n").as_bytes());

        let mut url = Url::parse(DRIVE_UPLOAD_URL)?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", "id");
        let response = self
            .session
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .body(body)
            .send()
            .context("Drive upload request failed")?;
        let uploaded: DriveFile = check(response, "Drive upload")?.json()?;
        info!(name, id = %uploaded.id, "uploaded to Drive");
        Ok(uploaded.id)
    }
}

impl ReportSource for DriveFolder {
    fn list(&self) -> Result<Vec<SourceFile>> {
        let query = format!(
            "'{}' in parents and mimeType='{CSV_MIME}' and trashed=false",
            self.folder_id
        );
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = Url::parse(DRIVE_FILES_URL)?;
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("q", &query)
                    .append_pair("orderBy", "name")
                    .append_pair("pageSize", "1000")
                    .append_pair("fields", "nextPageToken,files(id,name)");
                if let Some(token) = &page_token {
                    q.append_pair("pageToken", token);
                }
            }
            let response = self
                .session
                .get(url)
                .send()
                .context("Drive list request failed")?;
            let page: FileList = check(response, "Drive list")?.json()?;
            files.extend(page.files.into_iter().map(|f| SourceFile {
                id: f.id,
                name: f.name,
            }));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(folder = %self.folder_id, count = files.len(), "listed Drive folder");
        Ok(files)
    }

    fn fetch(&self, file: &SourceFile) -> Result<String> {
        let mut url = endpoint(DRIVE_FILES_URL, &[file.id.as_str()])?;
        url.query_pairs_mut().append_pair("alt", "media");
        let response = self
            .session
            .get(url)
            .send()
            .with_context(|| format!("cannot download '{}'", file.name))?;
        Ok(check(response, "Drive download")?.text()?)
    }
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_rows: usize,
}

fn whole_tab(name: &str) -> String {
    format!("'{}'!A:Z", name.replace('\'', "''"))
}

fn tab_origin(name: &str) -> String {
    format!("'{}'!A1", name.replace('\'', "''"))
}

/// A Google spreadsheet used as a tab sink.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    session: Session,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(token: &str, spreadsheet_id: &str) -> Self {
        Self {
            session: Session::new(token),
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    fn tab_titles(&self) -> Result<Vec<String>> {
        let mut url = endpoint(SHEETS_URL, &[self.spreadsheet_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let response = self
            .session
            .get(url)
            .send()
            .context("Sheets metadata request failed")?;
        let sheet: Spreadsheet = check(response, "Sheets metadata")?.json()?;
        Ok(sheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }
}

impl TabSink for SheetsClient {
    fn ensure_tab(&mut self, name: &str) -> Result<()> {
        if self.tab_titles()?.iter().any(|t| t == name) {
            debug!(tab = name, "tab already exists");
            return Ok(());
        }
        let url = endpoint(
            SHEETS_URL,
            &[format!("{}:batchUpdate", self.spreadsheet_id).as_str()],
        )?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": name } } }]
        });
        let response = self
            .session
            .post(url)
            .json(&body)
            .send()
            .context("Sheets addSheet request failed")?;
        check(response, "Sheets addSheet")?;
        info!(tab = name, "created tab");
        Ok(())
    }

    fn clear_tab(&mut self, name: &str) -> Result<()> {
        let url = endpoint(
            SHEETS_URL,
            &[
                self.spreadsheet_id.as_str(),
                "values",
                format!("{}:clear", whole_tab(name)).as_str(),
            ],
        )?;
        let response = self
            .session
            .post(url)
            .json(&json!({}))
            .send()
            .context("Sheets clear request failed")?;
        check(response, "Sheets clear")?;
        debug!(tab = name, "cleared tab");
        Ok(())
    }

    fn write_tab(&mut self, tab: &TabContent) -> Result<usize> {
        let mut url = endpoint(
            SHEETS_URL,
            &[self.spreadsheet_id.as_str(), "values", tab_origin(&tab.name).as_str()],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let body = json!({ "values": tab.values_json() });
        let response = self
            .session
            .put(url)
            .json(&body)
            .send()
            .context("Sheets update request failed")?;
        let updated: UpdateValuesResponse = check(response, "Sheets update")?.json()?;
        // The header row is part of the update.
        Ok(updated.updated_rows.saturating_sub(1))
    }
}
