//! Issue tracker adapter over a small HTTP/JSON API.
//!
//! Endpoints, all under the configured base URL:
//!   GET  /issue/{id}          -> issue document
//!   POST /issue/{id}/status   -> {"status": "..."}
//!   POST /issue/{id}/links    -> {"url": "..."}
//!
//! The token comes from the configured env var, falling back to a
//! `tracker-token` file under the user config dir.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::ident::TicketId;
use crate::services::IssueTracker;
use crate::ticket::{Ticket, TicketStatus};

pub struct HttpTracker {
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct IssueDto {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    priority: Option<String>,
    status: String,
    #[serde(default)]
    comments: Vec<CommentDto>,
}

#[derive(Deserialize)]
struct CommentDto {
    body: String,
}

impl IssueDto {
    fn into_ticket(self, id: TicketId) -> Result<Ticket> {
        let status = TicketStatus::parse(&self.status).ok_or_else(|| {
            Error::Tracker(format!("unknown status {:?} on {id}", self.status))
        })?;
        Ok(Ticket {
            id,
            title: self.title,
            description: self.description,
            labels: self.labels,
            priority: self.priority,
            status,
            comments: self.comments.into_iter().map(|c| c.body).collect(),
        })
    }
}

impl HttpTracker {
    /// # Errors
    /// A missing token in both the env var and the token file is
    /// `Error::Config`.
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let token = resolve_token(&config.token_env)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn map_err(id: &TicketId, err: ureq::Error) -> Error {
        match err {
            ureq::Error::StatusCode(404) => Error::NotFound(format!("ticket {id}")),
            other => Error::Tracker(other.to_string()),
        }
    }
}

fn resolve_token(token_env: &str) -> Result<String> {
    if let Ok(token) = std::env::var(token_env) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }
    let path = dirs::config_dir()
        .map(|d| d.join("tkt").join("tracker-token"))
        .filter(|p| p.exists());
    if let Some(path) = path {
        let token = std::fs::read_to_string(&path)?;
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }
    Err(Error::Config(format!(
        "no tracker token: set ${token_env} or write it to <config dir>/tkt/tracker-token"
    )))
}

impl IssueTracker for HttpTracker {
    fn fetch(&self, id: &TicketId) -> Result<Ticket> {
        let url = format!("{}/issue/{id}", self.base_url);
        debug!(%url, "fetching ticket");
        let body = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .map_err(|e| Self::map_err(id, e))?
            .into_body()
            .read_to_string()
            .map_err(|e| Error::Tracker(e.to_string()))?;
        let dto: IssueDto = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("issue document for {id}: {e}")))?;
        dto.into_ticket(id.clone())
    }

    fn set_status(&self, id: &TicketId, status: TicketStatus) -> Result<()> {
        let url = format!("{}/issue/{id}/status", self.base_url);
        debug!(%url, status = status.as_str(), "updating ticket status");
        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(json!({ "status": status.as_str() }))
            .map_err(|e| Self::map_err(id, e))?;
        Ok(())
    }

    fn attach_link(&self, id: &TicketId, link: &str) -> Result<()> {
        let url = format!("{}/issue/{id}/links", self.base_url);
        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(json!({ "url": link }))
            .map_err(|e| Self::map_err(id, e))?;
        Ok(())
    }
}
