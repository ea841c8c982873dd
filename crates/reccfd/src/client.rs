//! Thin HTTP client for the Supervisor's control surface, used to issue
//! the MASTER_RESTART action.

use serde::Deserialize;
use tracing::{error, info};

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct ServiceStateView {
    name: String,
}

#[derive(Clone)]
pub struct SupervisorClient {
    base_url: String,
    http: reqwest::Client,
}

impl SupervisorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn list_service_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/list", self.base_url);
        let services: Vec<ServiceStateView> = self.http.get(&url).send().await?.json().await?;
        Ok(services.into_iter().map(|s| s.name).collect())
    }

    async fn restart_one(&self, name: &str) -> Result<()> {
        let url = format!("{}/restart/{name}", self.base_url);
        let response = self.http.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(crate::error::CfdError::SupervisorStatus {
                service: name.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Restart every service currently known to the Supervisor, best-effort
    /// — one failed restart does not stop the rest.
    pub async fn master_restart(&self) -> Result<()> {
        let names = self.list_service_names().await?;
        info!(count = names.len(), "MASTER_RESTART issuing restart to all services");
        for name in names {
            if let Err(err) = self.restart_one(&name).await {
                error!(service = %name, error = %err, "MASTER_RESTART failed to restart service");
            }
        }
        Ok(())
    }
}
