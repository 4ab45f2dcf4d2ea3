use async_trait::async_trait;
use serde::Deserialize;

use super::server::OpenAppRequest;
use crate::error::Error;

/// Asks something to open a desktop application by spoken name.
#[async_trait]
pub trait AppLauncher: Send + Sync {
    async fn open_app(&self, app: &str) -> Result<(), Error>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Posts launch requests to the launcher backend.
pub struct LauncherClient {
    client: reqwest::Client,
    url: String,
}

impl LauncherClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl AppLauncher for LauncherClient {
    async fn open_app(&self, app: &str) -> Result<(), Error> {
        let failed = |reason: String| Error::LaunchFailed {
            app: app.to_string(),
            reason,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&OpenAppRequest {
                app: app.to_string(),
            })
            .send()
            .await
            .map_err(|err| failed(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(Error::UnsupportedApp(app.to_string()));
        }
        Err(failed(reason))
    }
}
