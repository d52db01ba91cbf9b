//! HTTP access to the prediction backend.
//!
//! Uploads go out as multipart forms and come back as a [`PredictResponse`];
//! report downloads are saved straight into the configured download folder.

use crate::core::models::PredictResponse;
use crate::core::policy::EvaluationPolicy;
use crate::services::ServiceError;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PREDICT_PATH: &str = "/api/predict";
/// Prediction mode the dashboard always requests
pub const PREDICT_MODE: &str = "full";
pub const SAMPLE_CSV_PATH: &str = "/api/sample/dummy-midterm-like-labeled";
const FALLBACK_DOWNLOAD_NAME: &str = "prediction_report.csv";

/// Normalize a configured base URL: trimmed, without trailing slashes
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve `path` against `base_url`. Absolute http(s) URLs pass through,
/// relative paths gain a leading `/` and the base when one is configured.
pub fn build_api_url(base_url: &str, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if base_url.is_empty() {
        normalized
    } else {
        format!("{base_url}{normalized}")
    }
}

/// File name for a downloaded report: last path segment of the URL
pub fn download_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => FALLBACK_DOWNLOAD_NAME.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ReportService {
    base_url: String,
    download_dir: PathBuf,
    client: reqwest::Client,
}

impl ReportService {
    pub fn new(base_url: &str, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            download_dir: download_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn api_url(&self, path: &str) -> String {
        build_api_url(&self.base_url, path)
    }

    /// Prediction endpoint with the mode query; needs an absolute URL
    pub fn predict_url(&self, mode: &str) -> Result<reqwest::Url, ServiceError> {
        let url = self.api_url(PREDICT_PATH);
        reqwest::Url::parse_with_params(&url, &[("mode", mode)])
            .map_err(|_| ServiceError::InvalidUrl(url))
    }

    pub fn sample_csv_url(&self) -> String {
        self.api_url(SAMPLE_CSV_PATH)
    }

    /// Upload `file` with `policy` and return the parsed report
    pub async fn predict_csv(
        &self,
        file: &Path,
        policy: &EvaluationPolicy,
        mode: &str,
    ) -> Result<PredictResponse, ServiceError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let policy_json = serde_json::to_string(policy)?;

        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new().part("file", part).text("policy", policy_json);

        let url = self.predict_url(mode)?;
        info!("uploading {} to {url}", file.display());
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::status(status.as_u16(), body));
        }
        let report: PredictResponse = response.json().await?;
        debug!(
            "received report '{}' with {} rows",
            report.report_filename,
            report.data.len()
        );
        Ok(report)
    }

    /// Fetch `path` (typically the report's download path) into the download
    /// folder and return where it was written
    pub async fn download(&self, path: &str) -> Result<PathBuf, ServiceError> {
        let url = self.api_url(path);
        if !is_absolute(&url) {
            return Err(ServiceError::InvalidUrl(url));
        }
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::status(status.as_u16(), body));
        }
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let target = self.download_dir.join(download_file_name(&url));
        tokio::fs::write(&target, &bytes).await?;
        info!("saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_api_url() {
        assert_eq!(build_api_url("", "/api/predict"), "/api/predict");
        assert_eq!(build_api_url("", "api/predict"), "/api/predict");
        assert_eq!(
            build_api_url("http://localhost:8000", "api/download/r.csv"),
            "http://localhost:8000/api/download/r.csv"
        );
        assert_eq!(
            build_api_url("http://localhost:8000", "HTTPS://cdn.example.com/r.csv"),
            "HTTPS://cdn.example.com/r.csv"
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("  http://host:8000/// "), "http://host:8000");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn test_predict_url_encodes_mode() {
        let service = ReportService::new("http://host/", "downloads");
        assert_eq!(
            service.predict_url("full").unwrap().as_str(),
            "http://host/api/predict?mode=full"
        );
        assert_eq!(
            service.predict_url("a b").unwrap().as_str(),
            "http://host/api/predict?mode=a+b"
        );
        let relative = ReportService::new("", "downloads");
        assert!(matches!(
            relative.predict_url("full"),
            Err(ServiceError::InvalidUrl(_))
        ));
        assert_eq!(
            service.sample_csv_url(),
            "http://host/api/sample/dummy-midterm-like-labeled"
        );
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name("http://h/api/download/prediction_report_1.csv?x=1"),
            "prediction_report_1.csv"
        );
        assert_eq!(download_file_name("http://h/"), "prediction_report.csv");
    }

    #[tokio::test]
    async fn test_download_without_base_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = ReportService::new("", dir.path());
        let err = service.download("/api/download/r.csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUrl(url) if url == "/api/download/r.csv"));
    }

    #[tokio::test]
    async fn test_predict_missing_file_is_io_error() {
        let service = ReportService::new("http://127.0.0.1:9", "downloads");
        let policy = crate::core::policy::PolicyForm::default().to_policy().unwrap();
        let err = service
            .predict_csv(Path::new("does/not/exist.csv"), &policy, "full")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
