//! NApps Server client
//!
//! Listing, authentication, upload, download and delete against the NApps
//! registry HTTP API. Every call is a single attempt.

use std::io::Write;

use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{NappError, Result};
use crate::napp::types::{NappId, NappManifest, NappRef};

/// Join a base URI and a relative path with exactly one slash between them
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NappListing {
    Bare(Vec<NappManifest>),
    Wrapped { napps: Vec<NappManifest> },
}

#[derive(Deserialize)]
struct TokenResponse {
    hash: String,
}

/// Registry client holding the API and repository base URIs and an optional
/// bearer token
#[derive(Clone)]
pub struct RegistryClient {
    api_uri: String,
    repo_uri: String,
    token: Option<String>,
    http: Client,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("api_uri", &self.api_uri)
            .field("repo_uri", &self.repo_uri)
            .field("token", &self.token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl RegistryClient {
    /// Create a client. `api_uri` serves `/api/...`, `repo_uri` serves packages.
    pub fn new(api_uri: impl Into<String>, repo_uri: impl Into<String>) -> Result<Self> {
        let http = Client::builder().user_agent("napp-cli").build()?;
        Ok(Self {
            api_uri: api_uri.into(),
            repo_uri: repo_uri.into(),
            token: None,
            http,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Package URL: `<repo>/<owner>/<name>-<version>.napp`
    pub fn package_url(&self, napp: &NappRef) -> String {
        endpoint(
            &self.repo_uri,
            &format!("{}/{}", napp.id.owner, napp.package_file_name()),
        )
    }

    fn require_token(&self) -> Result<&str> {
        self.token().ok_or_else(|| NappError::AuthFailed {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            reason: "no token; log in first".to_string(),
        })
    }

    /// Exchange credentials for a token. Only `201 Created` is accepted.
    pub fn request_token(&mut self, username: &str, password: &str) -> Result<String> {
        let url = endpoint(&self.api_uri, "api/auth/");
        let response = self
            .http
            .post(&url)
            .basic_auth(username, Some(password))
            .send()?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(NappError::AuthFailed {
                status: status.as_u16(),
                reason: reason(status),
            });
        }

        let body: TokenResponse = response.json()?;
        tracing::debug!(user = username, "received registry token");
        self.token = Some(body.hash.clone());
        Ok(body.hash)
    }

    /// All NApps published on the registry, in server order
    pub fn get_napps(&self) -> Result<Vec<NappManifest>> {
        let url = endpoint(&self.api_uri, "api/napps/");
        let response = self.http.get(&url).send()?.error_for_status()?;

        let listing: NappListing = response.json()?;
        Ok(match listing {
            NappListing::Bare(napps) => napps,
            NappListing::Wrapped { napps } => napps,
        })
    }

    /// Stream a package archive into `dest`
    pub fn download(&self, napp: &NappRef, dest: &mut impl Write) -> Result<u64> {
        let url = self.package_url(napp);
        tracing::debug!(url = %url, "downloading package");

        let download_err = |reason: String| NappError::Download {
            url: url.clone(),
            reason,
        };

        let mut response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| download_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download_err(format!("HTTP {}", response.status())));
        }

        response
            .copy_to(dest)
            .map_err(|e| download_err(e.to_string()))
    }

    /// Publish a NApp: metadata (with token) as JSON plus the package archive
    pub fn upload_napp(&self, metadata: &Value, package: Vec<u8>, file_name: &str) -> Result<()> {
        let token = self.require_token()?;
        let mut metadata = metadata.clone();
        if let Value::Object(map) = &mut metadata {
            map.insert("token".to_string(), Value::String(token.to_string()));
        }

        let form = multipart::Form::new()
            .text("json", serde_json::to_string(&metadata)?)
            .part(
                "file",
                multipart::Part::bytes(package).file_name(file_name.to_string()),
            );

        let url = endpoint(&self.api_uri, "api/napps/");
        let response = self.http.post(&url).multipart(form).send()?;
        expect_status(response, StatusCode::CREATED)?;

        tracing::info!(file = file_name, "uploaded package");
        Ok(())
    }

    /// Remove a published NApp
    pub fn delete(&self, id: &NappId) -> Result<()> {
        let token = self.require_token()?;
        let url = endpoint(&self.api_uri, &format!("api/napps/{}/{}/", id.owner, id.name));
        let response = self
            .http
            .delete(&url)
            .json(&json!({ "token": token }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NappError::RegistryRejected {
                status: status.as_u16(),
                reason: reason(status),
            });
        }

        tracing::info!(napp = %id, "deleted from registry");
        Ok(())
    }
}

fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    if status != expected {
        return Err(NappError::RegistryRejected {
            status: status.as_u16(),
            reason: reason(status),
        });
    }
    Ok(response)
}
