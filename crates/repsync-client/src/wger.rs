use std::time::Duration;

use async_trait::async_trait;
use repsync_core::config::HttpConfig;
use repsync_core::error::AppError;
use repsync_core::models::{RawEquipmentRecord, RawExerciseRecord};
use repsync_core::traits::{ExternalCatalog, SourcePage};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tokio::time::sleep;

/// Page size requested from the Wger API.
const PAGE_LIMIT: u32 = 100;

/// Wger language id for English; exercise names prefer this translation.
const ENGLISH_LANGUAGE_ID: i64 = 2;

/// Generic wrapper for paginated Wger API responses.
///
/// Wger API reference: <https://wger.de/en/software/api>
///
/// Every list endpoint returns the structure:
/// ```json
/// {
///     "count": 42,
///     "next": "https://wger.de/api/v2/equipment/?limit=100&offset=100",
///     "previous": null,
///     "results": [...]
/// }
/// ```
#[derive(Deserialize, Debug)]
struct WgerPage<T> {
    #[allow(dead_code)]
    count: u64,
    next: Option<String>,
    results: Vec<T>,
}

/// Data Transfer Object for a Wger equipment entry.
///
/// # Examples
///
/// ```
/// use repsync_client::wger::WgerEquipment;
///
/// let json = r#"{"id": 3, "name": "Dumbbell"}"#;
/// let equipment: WgerEquipment = serde_json::from_str(json).unwrap();
/// assert_eq!(equipment.name, "Dumbbell");
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct WgerEquipment {
    /// Wger's own id, not ours
    pub id: i64,
    pub name: String,
}

/// A muscle as returned by Wger, with both a Latin and an English name.
#[derive(Deserialize, Debug, Clone)]
pub struct WgerMuscle {
    pub id: i64,
    /// Latin/anatomical name (e.g. "Latissimus dorsi")
    #[serde(default)]
    pub name: String,
    /// English common name (e.g. "Lats"); may be blank
    #[serde(default)]
    pub name_en: String,
}

impl WgerMuscle {
    /// Preferred display name: the English common name when present,
    /// otherwise the anatomical one.
    pub fn display_name(&self) -> &str {
        if self.name_en.trim().is_empty() {
            &self.name
        } else {
            &self.name_en
        }
    }
}

/// One translated name of an exercise.
#[derive(Deserialize, Debug, Clone)]
pub struct WgerTranslation {
    pub language: i64,
    pub name: String,
}

/// Data Transfer Object for a Wger `exerciseinfo` entry.
#[derive(Deserialize, Debug, Clone)]
pub struct WgerExercise {
    pub id: i64,
    #[serde(default)]
    pub translations: Vec<WgerTranslation>,
    #[serde(default)]
    pub muscles: Vec<WgerMuscle>,
    #[serde(default)]
    pub muscles_secondary: Vec<WgerMuscle>,
    #[serde(default)]
    pub equipment: Vec<WgerEquipment>,
}

impl WgerExercise {
    /// The exercise name in English, falling back to the first available
    /// translation. `None` when the entry carries no usable name at all.
    pub fn display_name(&self) -> Option<&str> {
        self.translations
            .iter()
            .find(|t| t.language == ENGLISH_LANGUAGE_ID)
            .or_else(|| self.translations.first())
            .map(|t| t.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }
}

/// HTTP client for the Wger exercise database API.
///
/// Wger is an open-source workout manager whose public instance exposes a
/// REST catalog of equipment, muscles and exercises.
///
/// # Examples
///
/// ```no_run
/// use repsync_client::WgerClient;
/// use repsync_core::traits::ExternalCatalog;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WgerClient::new("https://wger.de/api/v2")?;
/// let page = client.equipment_page(None).await?;
/// println!("First page has {} equipment entries", page.items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WgerClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl WgerClient {
    /// Creates a new client for the given Wger API base URL
    /// (e.g. <https://wger.de/api/v2>) with default timeout and retry
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str) -> Result<Self, AppError> {
        Self::with_config(base_url_str, HttpConfig::default())
    }

    /// Creates a client with explicit timeout and retry settings.
    pub fn with_config(base_url_str: &str, config: HttpConfig) -> Result<Self, AppError> {
        // a trailing slash keeps Url::join from replacing the last segment
        let mut normalized = base_url_str.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|_| AppError::InvalidUrl(base_url_str.to_string()))?;

        let client = Client::builder()
            .user_agent("Repsync/0.1 (catalog-sync)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Resolves the URL for a page: the cursor (an absolute `next` URL from
    /// a previous page) when present, otherwise the first page of the
    /// endpoint.
    fn page_url(&self, endpoint: &str, cursor: Option<&str>) -> Result<Url, AppError> {
        match cursor {
            Some(next) => Url::parse(next).map_err(|_| AppError::InvalidUrl(next.to_string())),
            None => {
                let mut url = self
                    .base_url
                    .join(endpoint)
                    .map_err(|e| AppError::Generic(e.to_string()))?;
                url.query_pairs_mut()
                    .append_pair("limit", &PAGE_LIMIT.to_string());
                Ok(url)
            }
        }
    }

    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        cursor: Option<&str>,
    ) -> Result<WgerPage<T>, AppError> {
        let url = self.page_url(endpoint, cursor)?;
        let resp = self.request_with_retry(&url).await?;
        resp.json()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))
    }

    /// Makes an HTTP GET request with automatic retry on transient failures.
    ///
    /// Implements backoff for retries on:
    /// - Network errors
    /// - Timeouts
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    async fn request_with_retry(&self, url: &Url) -> Result<reqwest::Response, AppError> {
        let mut last_error = AppError::Generic("No attempts made".to_string());

        for attempt in 1..=self.max_retries {
            match self.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    // Rate limited - retry with backoff
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = AppError::RateLimitExceeded;
                        if attempt < self.max_retries {
                            sleep(self.retry_base_delay * 2_u32.pow(attempt)).await;
                            continue;
                        }
                    }

                    // Server error - retry
                    if status.is_server_error() {
                        last_error = AppError::ClientError(format!(
                            "Server error: HTTP {}",
                            status.as_u16()
                        ));
                        if attempt < self.max_retries {
                            sleep(self.retry_base_delay * attempt).await;
                            continue;
                        }
                    }

                    // Client error (4xx except 429) - don't retry
                    return Err(AppError::ClientError(format!(
                        "HTTP {} from {}",
                        status.as_u16(),
                        url
                    )));
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = AppError::Timeout(self.timeout.as_secs());
                    } else if e.is_connect() {
                        last_error = AppError::NetworkError(format!("Connection failed: {}", e));
                    } else {
                        last_error = AppError::ClientError(e.to_string());
                    }

                    if attempt < self.max_retries && (e.is_timeout() || e.is_connect()) {
                        sleep(self.retry_base_delay * attempt).await;
                        continue;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Converts a Wger equipment entry into the engine's raw record shape.
    /// Wger carries neither a description nor an enabled flag.
    fn into_raw_equipment(equipment: WgerEquipment) -> RawEquipmentRecord {
        RawEquipmentRecord {
            line: None,
            name: equipment.name,
            description: None,
            enabled: None,
        }
    }

    /// Converts a Wger exercise into the engine's raw record shape: names
    /// only, with all reference resolution left to the reconciler.
    fn into_raw_exercise(exercise: WgerExercise) -> RawExerciseRecord {
        let name = exercise.display_name().unwrap_or_default().to_string();
        RawExerciseRecord {
            line: None,
            name,
            enabled: None,
            primary_muscle_group: exercise
                .muscles
                .first()
                .map(|m| m.display_name().to_string()),
            secondary_muscle_groups: exercise
                .muscles_secondary
                .iter()
                .map(|m| m.display_name().to_string())
                .collect(),
            equipment: exercise.equipment.iter().map(|e| e.name.clone()).collect(),
        }
    }
}

#[async_trait]
impl ExternalCatalog for WgerClient {
    async fn equipment_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<RawEquipmentRecord>, AppError> {
        let page: WgerPage<WgerEquipment> = self.fetch_page("equipment/", cursor).await?;
        Ok(SourcePage {
            items: page
                .results
                .into_iter()
                .map(Self::into_raw_equipment)
                .collect(),
            next: page.next,
        })
    }

    async fn exercise_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<RawExerciseRecord>, AppError> {
        let page: WgerPage<WgerExercise> = self.fetch_page("exerciseinfo/", cursor).await?;
        Ok(SourcePage {
            items: page
                .results
                .into_iter()
                .map(Self::into_raw_exercise)
                .collect(),
            next: page.next,
        })
    }
}
