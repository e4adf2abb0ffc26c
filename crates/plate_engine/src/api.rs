use std::time::Duration;

use plate_logging::{plate_debug, plate_warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ApiError, FailureKind, ImageUpload, JobStatus, MealRecord};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The four backend calls the client makes.
#[async_trait::async_trait]
pub trait MealApi: Send + Sync {
    /// `POST /users`; returns the new user id.
    async fn create_user(&self, name: &str, email: &str) -> Result<String, ApiError>;

    /// `POST /meals/analyze`; returns the analysis event id.
    async fn start_analysis(&self, user_id: &str, image: &ImageUpload)
        -> Result<String, ApiError>;

    /// `GET /meals/status/{eventId}`.
    async fn job_status(&self, event_id: &str) -> Result<JobStatus, ApiError>;

    /// `GET /users/{userId}/meals`.
    async fn fetch_meals(&self, user_id: &str) -> Result<Vec<MealRecord>, ApiError>;
}

#[derive(Debug, Serialize)]
struct CreateUserBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisStarted {
    event_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestMealApi {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestMealApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base_url, client })
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let path = url.path().to_string();
        let response = build(self.client.request(method.clone(), url))
            .send()
            .await
            .map_err(|err| {
                plate_warn!("{} {} failed: {}", method, path, err);
                map_reqwest_error(err)
            })?;

        let status = response.status();
        plate_debug!("{} {} -> {}", method, path, status.as_u16());
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl MealApi for ReqwestMealApi {
    async fn create_user(&self, name: &str, email: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["users"])?;
        let body = serde_json::to_vec(&CreateUserBody { name, email })
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let created: CreatedUser = self
            .send(Method::POST, url, |request| {
                request.header(CONTENT_TYPE, "application/json").body(body)
            })
            .await?;
        Ok(created.id)
    }

    async fn start_analysis(
        &self,
        user_id: &str,
        image: &ImageUpload,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(&["meals", "analyze"])?;
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let form = Form::new()
            .part("image", part)
            .text("userId", user_id.to_string());
        let started: AnalysisStarted = self
            .send(Method::POST, url, |request| request.multipart(form))
            .await?;
        Ok(started.event_id)
    }

    async fn job_status(&self, event_id: &str) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["meals", "status", event_id])?;
        let body: StatusBody = self.send(Method::GET, url, |request| request).await?;
        Ok(JobStatus::parse(&body.status))
    }

    async fn fetch_meals(&self, user_id: &str) -> Result<Vec<MealRecord>, ApiError> {
        let url = self.endpoint(&["users", user_id, "meals"])?;
        self.send(Method::GET, url, |request| request).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
