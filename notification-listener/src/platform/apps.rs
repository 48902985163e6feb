/*!
Installed-application enumeration off the ingestion and command paths
*/

use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::core::error::EnumerationError;
use crate::platform::{AppCatalog, InstalledApp};

pub type EnumerationResult = Result<Vec<InstalledApp>, EnumerationError>;

/// Run enumeration on a blocking worker; the result arrives exactly once on
/// the returned receiver.
pub fn spawn_enumeration(catalog: Arc<dyn AppCatalog>) -> oneshot::Receiver<EnumerationResult> {
    let (tx, rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let result = catalog.installed_apps();
        match &result {
            Ok(apps) => debug!("Enumerated {} installed applications", apps.len()),
            Err(e) => error!("Installed application enumeration failed: {}", e),
        }
        if tx.send(result).is_err() {
            debug!("Enumeration caller went away before the result was ready");
        }
    });

    rx
}

/// Enumerate and wait for the single answer
pub async fn enumerate(catalog: Arc<dyn AppCatalog>) -> EnumerationResult {
    spawn_enumeration(catalog)
        .await
        .unwrap_or(Err(EnumerationError::WorkerGone))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listed(Vec<InstalledApp>);

    impl AppCatalog for Listed {
        fn installed_apps(&self) -> EnumerationResult {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl AppCatalog for Broken {
        fn installed_apps(&self) -> EnumerationResult {
            Err(EnumerationError::ReadDir {
                path: "/nowhere".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    struct Panicking;

    impl AppCatalog for Panicking {
        fn installed_apps(&self) -> EnumerationResult {
            panic!("catalog blew up")
        }
    }

    #[tokio::test]
    async fn result_comes_back_from_worker() {
        let app = InstalledApp {
            app_name: "Mail".to_string(),
            package_name: "org.example.Mail".to_string(),
            app_icon: String::new(),
        };
        let apps = enumerate(Arc::new(Listed(vec![app.clone()]))).await.unwrap();
        assert_eq!(apps, vec![app]);
    }

    #[tokio::test]
    async fn errors_are_forwarded() {
        assert!(matches!(
            enumerate(Arc::new(Broken)).await,
            Err(EnumerationError::ReadDir { .. })
        ));
    }

    #[tokio::test]
    async fn dead_worker_is_reported() {
        assert!(matches!(
            enumerate(Arc::new(Panicking)).await,
            Err(EnumerationError::WorkerGone)
        ));
    }
}
