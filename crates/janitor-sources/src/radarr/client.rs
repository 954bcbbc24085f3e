use crate::error::SourceError;
use crate::traits::MovieCatalog;
use async_trait::async_trait;
use janitor_models::{DeleteOptions, ManagedMovie};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const SERVICE: &str = "radarr";
const API_EXTENSION: &str = "api/v3";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin client over the Radarr v3 REST API. Auth is the `apikey` query parameter.
pub struct RadarrClient {
    client: Client,
    api_host: String,
    api_key: String,
}

impl RadarrClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        Ok(Self {
            client,
            api_host: api_host(base_url),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_host, endpoint)
    }

    fn check(
        method: &'static str,
        endpoint: &str,
        response: Response,
    ) -> Result<Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SourceError::Status {
                service: SERVICE,
                method,
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// Reachability check; returns the Radarr version string.
    pub async fn ping(&self) -> Result<String, SourceError> {
        let endpoint = "system/status";
        let response = self
            .client
            .get(self.url(endpoint))
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;
        let json: Value = Self::check("GET", endpoint, response)?
            .json()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        Ok(json
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string())
    }
}

#[async_trait]
impl MovieCatalog for RadarrClient {
    async fn fetch_movies(&self) -> Result<Vec<ManagedMovie>, SourceError> {
        let endpoint = "movie";
        let response = self
            .client
            .get(self.url(endpoint))
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        let movies: Vec<ManagedMovie> = Self::check("GET", endpoint, response)?
            .json()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        debug!(count = movies.len(), "Radarr catalog fetched");
        Ok(movies)
    }

    async fn update_movie(&self, movie: &ManagedMovie) -> Result<(), SourceError> {
        let endpoint = format!("movie/{}", movie.id);
        let response = self
            .client
            .put(self.url(&endpoint))
            .query(&[("apikey", self.api_key.as_str())])
            .json(movie)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        Self::check("PUT", &endpoint, response)?;
        info!(id = movie.id, title = %movie.title, monitored = movie.monitored, "Radarr movie updated");
        Ok(())
    }

    async fn delete_movie(&self, id: i64, options: DeleteOptions) -> Result<(), SourceError> {
        let endpoint = format!("movie/{}", id);
        let response = self
            .client
            .delete(self.url(&endpoint))
            .query(&delete_query(&self.api_key, options))
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(SERVICE, e))?;

        Self::check("DELETE", &endpoint, response)?;
        info!(id, "Radarr movie deleted");
        Ok(())
    }
}

/// `http://host:7878/` or `http://host:7878` -> `http://host:7878/api/v3`
fn api_host(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), API_EXTENSION)
}

fn delete_query(api_key: &str, options: DeleteOptions) -> Vec<(&'static str, String)> {
    vec![
        ("apikey", api_key.to_string()),
        ("deleteFiles", options.delete_files.to_string()),
        ("addImportExclusion", options.add_import_exclusion.to_string()),
    ]
}
