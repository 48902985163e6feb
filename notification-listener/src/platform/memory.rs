/*!
Headless platform kept entirely in memory
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::{
    error::{EnumerationError, ResolveError},
    normalizer::SourceResolver,
};
use crate::platform::{AccessControl, AppCatalog, Host, InstalledApp};

/// Fixed application list with a toggleable access grant
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    granted: AtomicBool,
    apps: Vec<InstalledApp>,
}

impl InMemoryPlatform {
    pub fn new(apps: Vec<InstalledApp>) -> Self {
        Self {
            granted: AtomicBool::new(false),
            apps,
        }
    }

    pub fn with_app(mut self, package_name: &str, app_name: &str) -> Self {
        self.apps.push(InstalledApp {
            app_name: app_name.to_string(),
            package_name: package_name.to_string(),
            app_icon: String::new(),
        });
        self
    }

    /// Wire this platform in as every host collaborator
    pub fn into_host(self) -> Host {
        let platform = Arc::new(self);
        Host {
            access: platform.clone(),
            catalog: platform.clone(),
            resolver: platform,
        }
    }
}

impl AccessControl for InMemoryPlatform {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_grant(&self) -> std::io::Result<()> {
        self.granted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl AppCatalog for InMemoryPlatform {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>, EnumerationError> {
        let mut apps = self.apps.clone();
        apps.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        Ok(apps)
    }
}

impl SourceResolver for InMemoryPlatform {
    fn resolve_name(&self, source_id: &str) -> Result<String, ResolveError> {
        self.apps
            .iter()
            .find(|app| app.package_name == source_id)
            .map(|app| app.app_name.clone())
            .ok_or_else(|| ResolveError::UnknownSource(source_id.to_string()))
    }
}
