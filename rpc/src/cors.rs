//! Cross-origin resource sharing.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

/// CORS settings. Empty lists allow nothing for that dimension; `"*"` as the
/// only entry allows anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsSettings {
    #[serde(default)]
    pub origins: Vec<String>,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub credentials: bool,
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".into(), "POST".into()]
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            origins: Vec::new(),
            methods: default_methods(),
            headers: Vec::new(),
            credentials: false,
            max_age_secs: None,
        }
    }
}

impl CorsSettings {
    /// Build the layer. Entries that are not valid header values are
    /// skipped with a warning.
    pub fn layer(&self) -> CorsLayer {
        let mut layer = CorsLayer::new();

        if is_wildcard(&self.origins) {
            layer = layer.allow_origin(AllowOrigin::any());
        } else if !self.origins.is_empty() {
            layer = layer.allow_origin(parse_all::<HeaderValue>(&self.origins, "origin"));
        }

        if is_wildcard(&self.methods) {
            layer = layer.allow_methods(AllowMethods::any());
        } else {
            layer = layer.allow_methods(parse_all::<Method>(&self.methods, "method"));
        }

        if is_wildcard(&self.headers) {
            layer = layer.allow_headers(AllowHeaders::any());
        } else if !self.headers.is_empty() {
            let headers = parse_all::<HeaderName>(&self.headers, "header");
            layer = layer
                .allow_headers(headers.clone())
                .expose_headers(headers);
        }

        // Credentials cannot be combined with wildcards.
        let any_wildcard = [&self.origins, &self.methods, &self.headers]
            .into_iter()
            .any(|values| is_wildcard(values));
        if self.credentials && !any_wildcard {
            layer = layer.allow_credentials(true);
        }

        if let Some(secs) = self.max_age_secs {
            layer = layer.max_age(Duration::from_secs(secs));
        }
        layer
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.len() == 1 && values[0].trim() == "*"
}

fn parse_all<T: std::str::FromStr>(values: &[String], what: &str) -> Vec<T> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter_map(|v| match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(value = v, "ignoring invalid CORS {what}");
                None
            }
        })
        .collect()
}
