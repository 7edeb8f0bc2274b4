//! Signed-in account, persisted to a small file between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use voe_core::routes;
use voe_core::types::EntityKind;

use crate::store::EntityStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSession {
    path: PathBuf,
    account_id: Option<String>,
}

impl AccountSession {
    /// Read the account file. A missing or blank file means signed out.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let account_id = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text.trim().to_string()).filter(|id| !id.is_empty()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(Self { path, account_id })
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.account_id.is_some()
    }

    /// Store the account id handed back by the identity provider.
    pub fn sign_in(&mut self, account_id: &str) -> std::io::Result<()> {
        std::fs::write(&self.path, account_id)?;
        tracing::info!(path = %self.path.display(), "Account signed in");
        self.account_id = Some(account_id.to_string());
        Ok(())
    }

    pub fn sign_out(&mut self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        self.account_id = None;
        Ok(())
    }
}

/// First page after sign-in: the deployment list once anything exists,
/// the getting-started page before that.
pub fn landing_route(store: &EntityStore) -> String {
    if store.has_any_configured() {
        routes::list_route(EntityKind::Deployment)
    } else {
        routes::GET_STARTED.to_string()
    }
}
