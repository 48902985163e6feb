/*!
Operating-system collaborators the listener core calls into
*/

pub mod access;
pub mod apps;
pub mod desktop_entries;
pub mod memory;

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::core::{error::EnumerationError, normalizer::SourceResolver};

/// Grants the listener access to the notification surface
pub trait AccessControl: Send + Sync {
    fn is_granted(&self) -> bool;

    fn request_grant(&self) -> std::io::Result<()>;
}

/// Enumerates installed applications. May perform slow, blocking I/O.
pub trait AppCatalog: Send + Sync {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>, EnumerationError>;
}

/// An application a user can pick for the allow-list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    pub app_name: String,
    pub package_name: String,
    /// Icon name from the desktop entry, empty when none is declared
    pub app_icon: String,
}

/// The platform collaborators wired into one listener
#[derive(Clone)]
pub struct Host {
    pub access: Arc<dyn AccessControl>,
    pub catalog: Arc<dyn AppCatalog>,
    pub resolver: Arc<dyn SourceResolver>,
}
