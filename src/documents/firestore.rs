//! Cloud Firestore REST client
//!
//! Reads single documents through
//! `GET /v1/projects/{project}/databases/(default)/documents/{collection}/{key}`
//! and flattens Firestore's typed value encoding into plain JSON:
//!
//! ```text
//! {"fields": {"nama": {"stringValue": "Budi"}, "angkatan": {"integerValue": "2023"}}}
//!   -> {"nama": "Budi", "angkatan": 2023}
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::auth::AccessTokenSource;
use crate::config::FirebaseConfig;
use crate::documents::DocumentStore;
use crate::error::{KampusError, Result};

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FirestoreError {
    error: FirestoreErrorBody,
}

#[derive(Debug, Deserialize)]
struct FirestoreErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// [`DocumentStore`] backed by the Cloud Firestore REST API.
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    tokens: Option<Arc<dyn AccessTokenSource>>,
}

impl FirestoreClient {
    /// Builds a client for the configured project.
    ///
    /// `tokens` supplies the signed-in user's ID token; without it requests
    /// are sent unauthenticated and only succeed against open security rules.
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Config` if the Firestore URL is invalid.
    pub fn new(config: &FirebaseConfig, tokens: Option<Arc<dyn AccessTokenSource>>) -> Result<Self> {
        let base_url = Url::parse(&config.firestore_url).map_err(|e| {
            KampusError::Config(format!("Invalid firestore_url {}: {}", config.firestore_url, e))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(KampusError::Http)?;

        Ok(Self {
            http,
            base_url,
            project_id: config.project_id.clone(),
            tokens,
        })
    }

    /// Builds the URL of one document, percent-encoding each segment so a
    /// key can never address a collection or a sub-path.
    fn document_url(&self, collection: &str, key: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| KampusError::Config("firestore_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
                key,
            ]);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        if collection.trim().is_empty() || key.trim().is_empty() {
            return Err(KampusError::Fetch(
                "document reads need both a collection and a key".to_string(),
            )
            .into());
        }

        let url = self.document_url(collection, key)?;
        tracing::debug!(collection = %collection, key = %key, "Fetching document");

        let mut request = self.http.get(url);
        if let Some(tokens) = &self.tokens {
            if let Some(token) = tokens.access_token().await? {
                request = request.bearer_auth(token);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| KampusError::Fetch(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document: FirestoreDocument = response
                    .json()
                    .await
                    .map_err(|e| KampusError::Fetch(format!("malformed document: {}", e)))?;
                Ok(Some(decode_fields(&document.fields)))
            }
            status => {
                let detail = match response.json::<FirestoreError>().await {
                    Ok(body) if !body.error.status.is_empty() => {
                        format!("{} {}", body.error.status, body.error.message)
                    }
                    Ok(body) => body.error.message,
                    Err(_) => String::new(),
                };
                Err(KampusError::Fetch(format!("HTTP {}: {}", status.as_u16(), detail.trim())).into())
            }
        }
    }
}

/// Flattens a Firestore `fields` map into a JSON object.
pub fn decode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), decode_value(value)))
            .collect(),
    )
}

/// Flattens one Firestore typed value.
///
/// Unknown or malformed encodings decode to `null`.
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        // int64 travels as a decimal string
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields),
            None => Value::Object(Map::new()),
        },
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}
