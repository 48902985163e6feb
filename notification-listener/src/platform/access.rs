/*!
Access to the notification feed spool
*/

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tracing::info;

use crate::platform::AccessControl;

/// Access is granted once the feed spool exists and can be read
pub struct SpoolAccess {
    spool_path: PathBuf,
}

impl SpoolAccess {
    pub fn new(spool_path: PathBuf) -> Self {
        Self { spool_path }
    }
}

impl AccessControl for SpoolAccess {
    fn is_granted(&self) -> bool {
        fs::File::open(&self.spool_path).is_ok()
    }

    fn request_grant(&self) -> std::io::Result<()> {
        if let Some(parent) = self.spool_path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.spool_path)?;

        info!("Notification feed spool ready at {:?}", self.spool_path);
        Ok(())
    }
}
