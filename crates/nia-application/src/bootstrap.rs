//! Composition root.

use crate::child_session_usecase::ChildSessionUseCase;
use anyhow::{Context, Result};
use nia_core::config::RootConfig;
use nia_core::session::{MemorySessionRepository, SessionRepository, SessionStore};
use nia_infrastructure::{GuardianCredentialStorage, NiaPaths, TomlSessionRepository};
use nia_interaction::{
    ApiClient, HttpAssistantClient, HttpFeedbackClient, HttpIdentityDirectory, HttpPinVerifier,
};
use std::sync::Arc;

/// Builds a [`ChildSessionUseCase`] from configuration.
///
/// - HTTP clients share one [`ApiClient`] (turns get their own timeout)
/// - `[session] persist = true` stores the session in `session.toml`;
///   `false` keeps it in memory for this process only
/// - The Session Store is restored from disk, so a signed-in child stays
///   signed in across restarts
pub struct AppBootstrap {
    config: RootConfig,
    paths: NiaPaths,
}

impl AppBootstrap {
    pub fn new(config: RootConfig, paths: NiaPaths) -> Self {
        Self { config, paths }
    }

    pub async fn build(self) -> Result<ChildSessionUseCase> {
        let token = match GuardianCredentialStorage::new(&self.paths)
            .and_then(|storage| storage.guardian_token())
        {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Guardian credentials unavailable");
                None
            }
        };
        if token.is_none() {
            tracing::debug!("No guardian token configured; profile listing may be refused");
        }

        let api = ApiClient::new(
            self.config.api.base_url.clone(),
            token,
            self.config.timeouts.request(),
        );

        let repository: Arc<dyn SessionRepository> = if self.config.session.persist {
            Arc::new(
                TomlSessionRepository::from_paths(&self.paths)
                    .context("Failed to resolve session file")?,
            )
        } else {
            Arc::new(MemorySessionRepository::new())
        };
        let sessions = Arc::new(SessionStore::restore(repository).await);

        tracing::info!(
            base_url = %api.base_url(),
            persist = self.config.session.persist,
            signed_in = sessions.is_authenticated(),
            "Nia initialized"
        );

        Ok(ChildSessionUseCase::new(
            sessions,
            Arc::new(HttpIdentityDirectory::new(api.clone())),
            Arc::new(HttpPinVerifier::new(api.clone())),
            Arc::new(HttpAssistantClient::new(
                api.clone().with_timeout(self.config.timeouts.turn()),
            )),
            Arc::new(HttpFeedbackClient::new(api)),
            self.config.timeouts.clone(),
        ))
    }
}
