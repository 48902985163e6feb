/*!
Freedesktop application catalog.
Reads `.desktop` entries to enumerate installed applications and to resolve
notification source ids to display names.
*/

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::{
    config::CatalogConfig,
    error::{EnumerationError, ResolveError},
    normalizer::SourceResolver,
};
use crate::platform::{AppCatalog, InstalledApp};

#[derive(Debug, Clone, PartialEq)]
pub struct DesktopEntry {
    /// Desktop file id, e.g. `org.gnome.Nautilus`
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    /// `NoDisplay` or `Hidden` entries, not shown in application menus
    pub hidden: bool,
}

/// Parse the `[Desktop Entry]` group of a desktop file. Returns `None` for
/// entries that are not applications or carry no name.
pub fn parse_desktop_entry(id: &str, contents: &str) -> Option<DesktopEntry> {
    let mut in_main_group = false;
    let mut name = None;
    let mut icon = None;
    let mut hidden = false;
    let mut is_application = true;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        // localized keys such as Name[de] are skipped
        match (key.trim(), value.trim()) {
            ("Name", v) if !v.is_empty() => name = Some(v.to_string()),
            ("Icon", v) if !v.is_empty() => icon = Some(v.to_string()),
            ("NoDisplay", "true") | ("Hidden", "true") => hidden = true,
            ("Type", v) => is_application = v == "Application",
            _ => {}
        }
    }

    if !is_application {
        return None;
    }

    Some(DesktopEntry {
        id: id.to_string(),
        name: name?,
        icon,
        hidden,
    })
}

/// Application catalog backed by desktop entries. Later directories take
/// precedence when two of them define the same id.
pub struct DesktopEntryCatalog {
    dirs: Vec<PathBuf>,
    include_hidden: bool,
    entry_cache: RwLock<HashMap<String, DesktopEntry>>,
}

impl DesktopEntryCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            dirs: config.desktop_dirs.clone(),
            include_hidden: config.include_hidden,
            entry_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build a catalog and fill its cache. A failed scan leaves the cache
    /// empty; names then fall back to source ids.
    pub fn load(config: &CatalogConfig) -> Self {
        let catalog = Self::new(config);
        match catalog.refresh() {
            Ok(count) => info!("Loaded {} desktop entries", count),
            Err(e) => warn!("Desktop entry scan failed: {}", e),
        }
        catalog
    }

    /// Rescan every directory and replace the cache
    pub fn refresh(&self) -> Result<usize, EnumerationError> {
        let entries = self.scan()?;
        let count = entries.len();

        let mut cache = self.entry_cache.write().unwrap_or_else(|p| p.into_inner());
        *cache = entries;
        Ok(count)
    }

    pub fn get_entry(&self, id: &str) -> Option<DesktopEntry> {
        self.entry_cache.read().ok()?.get(id).cloned()
    }

    fn scan(&self) -> Result<HashMap<String, DesktopEntry>, EnumerationError> {
        let mut entries = HashMap::new();

        for dir in &self.dirs {
            let listing = match fs::read_dir(dir) {
                Ok(listing) => listing,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Skipping missing application directory {:?}", dir);
                    continue;
                }
                Err(source) => {
                    return Err(EnumerationError::ReadDir {
                        path: dir.clone(),
                        source,
                    });
                }
            };

            for item in listing {
                let path = match item {
                    Ok(item) => item.path(),
                    Err(e) => {
                        warn!("Failed to read an entry of {:?}: {}", dir, e);
                        continue;
                    }
                };
                if let Some(entry) = Self::read_entry(&path) {
                    entries.insert(entry.id.clone(), entry);
                }
            }
        }

        Ok(entries)
    }

    fn read_entry(path: &Path) -> Option<DesktopEntry> {
        if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
            return None;
        }
        let id = path.file_stem()?.to_str()?;

        match fs::read_to_string(path) {
            Ok(contents) => {
                let entry = parse_desktop_entry(id, &contents);
                if entry.is_none() {
                    debug!("Ignoring non-application desktop entry {:?}", path);
                }
                entry
            }
            Err(e) => {
                warn!("Failed to read desktop entry {:?}: {}", path, e);
                None
            }
        }
    }
}

impl AppCatalog for DesktopEntryCatalog {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>, EnumerationError> {
        self.refresh()?;

        let cache = self.entry_cache.read().unwrap_or_else(|p| p.into_inner());
        let mut apps: Vec<InstalledApp> = cache
            .values()
            .filter(|entry| self.include_hidden || !entry.hidden)
            .map(|entry| InstalledApp {
                app_name: entry.name.clone(),
                package_name: entry.id.clone(),
                app_icon: entry.icon.clone().unwrap_or_default(),
            })
            .collect();

        apps.sort_by(|a, b| {
            a.app_name
                .cmp(&b.app_name)
                .then_with(|| a.package_name.cmp(&b.package_name))
        });
        Ok(apps)
    }
}

impl SourceResolver for DesktopEntryCatalog {
    fn resolve_name(&self, source_id: &str) -> Result<String, ResolveError> {
        let cache = self
            .entry_cache
            .read()
            .map_err(|e| ResolveError::CacheUnavailable(e.to_string()))?;

        cache
            .get(source_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| ResolveError::UnknownSource(source_id.to_string()))
    }
}
