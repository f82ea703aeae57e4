use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::fetcher::{Fetch, FetchError};
use crate::file_manager::{DirStatus, FileManager};
use crate::html_parser::{Element, HtmlDocument};
use crate::path_mapper;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::resolver;
use crate::target::PageTarget;

/// Why an asset was left as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The link attribute is absent or empty
    MissingLink,
    ForeignHost { domain: String },
    UnsupportedScheme { scheme: String },
    /// Another URL already claimed the same local file name
    NameCollision { path: PathBuf, claimed_by: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of handling one asset reference.
#[derive(Debug)]
pub enum AssetOutcome {
    Processed { url: String, local_link: String },
    Skipped(SkipReason),
    Failed(AssetError),
}

impl AssetOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, AssetOutcome::Processed { .. })
    }
}

/// Outcomes of one pipeline run, in enumeration order.
#[derive(Debug, Default)]
pub struct AssetReport {
    outcomes: Vec<AssetOutcome>,
}

impl AssetReport {
    pub fn outcomes(&self) -> &[AssetOutcome] {
        &self.outcomes
    }

    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AssetOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AssetOutcome::Failed(_)))
            .count()
    }
}

/// What one run put on disk.
#[derive(Debug, Default)]
struct Written {
    dir: Option<DirStatus>,
    new_files: Vec<PathBuf>,
}

/// Downloads a page's assets and points the document at the local copies.
///
/// Owns the assets directory: it is created right before the first asset is
/// written and removed again when no asset made it to disk. A directory left
/// by an earlier run is reused, and a rollback only removes the files this
/// run added to it.
pub struct AssetPipeline<'a, F> {
    fetcher: &'a F,
    settings: &'a Settings,
    target: &'a PageTarget,
    file_manager: FileManager,
    observer: &'a dyn ProgressObserver,
    written: RefCell<Written>,
}

impl<'a, F: Fetch> AssetPipeline<'a, F> {
    pub fn new(
        fetcher: &'a F,
        settings: &'a Settings,
        target: &'a PageTarget,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        debug!(
            "Asset pipeline for {}: domain={}, base_url={}, full_domain={}, assets_path={:?}",
            target.url(),
            target.domain(),
            target.base_url(),
            target.full_domain(),
            target.assets_path()
        );

        Self {
            fetcher,
            settings,
            target,
            file_manager: FileManager::new(target.output_dir()),
            observer,
            written: RefCell::new(Written::default()),
        }
    }

    /// Elements of every configured asset tag, tag by tag, each in document order.
    pub fn find_assets(&self, document: &HtmlDocument) -> Vec<Element> {
        self.settings
            .asset_tags
            .iter()
            .flat_map(|(tag, _)| document.elements_by_tag(tag))
            .collect()
    }

    pub async fn process_assets(&self, document: &mut HtmlDocument) -> AssetReport {
        let assets = self.find_assets(document);
        self.observer.notify(ProgressEvent::AssetsFound {
            count: assets.len(),
        });

        if assets.is_empty() {
            debug!("No assets found on {}", self.target.url());
            return AssetReport::default();
        }

        match self.file_manager.create_dir(self.target.assets_dir_name()) {
            Ok(status) => self.written.borrow_mut().dir = Some(status),
            Err(e) => {
                warn!(
                    "Failed to create assets directory {:?}, saving page without assets: {}",
                    self.target.assets_path(),
                    e
                );
                return AssetReport::default();
            }
        }

        let mut report = AssetReport::default();
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();

        for asset in &assets {
            let outcome = self.process_asset(asset, &mut claimed).await;

            match &outcome {
                AssetOutcome::Processed { url, local_link } => {
                    debug!("Asset {} saved as {}", url, local_link);
                    self.observer.notify(ProgressEvent::AssetDone {
                        url: url.clone(),
                        saved: true,
                    });
                }
                AssetOutcome::Skipped(reason) => {
                    debug!("Skipped <{}> asset: {:?}", asset.tag(), reason);
                    self.observer.notify(ProgressEvent::AssetDone {
                        url: self.raw_link(asset),
                        saved: false,
                    });
                }
                AssetOutcome::Failed(e) => {
                    warn!("Asset skipped: {}", e);
                    let url = match e {
                        AssetError::Fetch(FetchError::Status { url, .. })
                        | AssetError::Fetch(FetchError::Request { url, .. }) => url.clone(),
                        AssetError::Write { path, .. } => path.display().to_string(),
                    };
                    self.observer.notify(ProgressEvent::AssetDone { url, saved: false });
                }
            }

            report.outcomes.push(outcome);
        }

        if report.processed() == 0 {
            debug!("No assets saved for {}", self.target.url());
            self.rollback();
        }

        report
    }

    /// Undoes this run's asset writes. A directory this run created goes
    /// with everything in it; in a reused directory only the files this run
    /// added are deleted. Failures are logged.
    pub fn rollback(&self) {
        let written = self.written.take();
        match written.dir {
            None => {}
            Some(DirStatus::Created) => {
                match self.file_manager.remove_dir(self.target.assets_dir_name()) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!(
                        "Failed to remove assets directory {:?}: {}",
                        self.target.assets_path(),
                        e
                    ),
                }
            }
            Some(DirStatus::Existing) => {
                for path in &written.new_files {
                    if let Err(e) = self.file_manager.remove_file(path) {
                        warn!("Failed to remove asset {:?}: {}", path, e);
                    }
                }
            }
        }
    }

    /// Attribute value as found in the document, for reporting.
    fn raw_link(&self, asset: &Element) -> String {
        self.settings
            .link_attr(&asset.tag())
            .and_then(|attr| asset.attr(attr))
            .unwrap_or_default()
    }

    async fn process_asset(
        &self,
        asset: &Element,
        claimed: &mut HashMap<PathBuf, String>,
    ) -> AssetOutcome {
        let tag = asset.tag();
        let Some(attr) = self.settings.link_attr(&tag) else {
            return AssetOutcome::Skipped(SkipReason::MissingLink);
        };

        let raw_value = match asset.attr(attr) {
            Some(value) => link_value(attr, &value),
            None => String::new(),
        };
        if raw_value.is_empty() {
            return AssetOutcome::Skipped(SkipReason::MissingLink);
        }
        debug!("Asset URL: {}", raw_value);

        if let Some(scheme) = resolver::unsupported_scheme(&raw_value) {
            return AssetOutcome::Skipped(SkipReason::UnsupportedScheme { scheme });
        }

        if self.settings.ignore_other_hosts
            && resolver::is_other_domain(&raw_value, self.target.domain())
        {
            return AssetOutcome::Skipped(SkipReason::ForeignHost {
                domain: crate::url_utils::domain(&raw_value),
            });
        }

        let request_url = resolver::resolve_asset_url(
            &raw_value,
            self.target.base_url(),
            self.target.full_domain(),
        );
        let link_url = path_mapper::document_link_url(&request_url, self.is_document_link(asset));
        let save_path = path_mapper::save_location_for(
            &link_url,
            self.target.output_dir(),
            self.target.assets_dir_name(),
        );
        let local_link = path_mapper::local_link_for(&link_url, self.target.assets_dir_name());

        match claimed.get(&save_path) {
            Some(owner) if owner == &request_url => {
                // Already on disk from an earlier reference
                asset.set_attr(attr, &local_link);
                return AssetOutcome::Processed {
                    url: request_url,
                    local_link,
                };
            }
            Some(owner) => {
                return AssetOutcome::Skipped(SkipReason::NameCollision {
                    path: save_path,
                    claimed_by: owner.clone(),
                });
            }
            None => {}
        }

        debug!("Path to save asset: {:?}", save_path);
        let body = match self.fetcher.fetch(&request_url).await {
            Ok(body) => body,
            Err(e) => return AssetOutcome::Failed(e.into()),
        };

        let is_new = !save_path.exists();
        if let Err(source) = self.file_manager.save_bytes(&save_path, &body) {
            if is_new && save_path.is_file() {
                if let Err(e) = self.file_manager.remove_file(&save_path) {
                    warn!("Failed to remove partial asset {:?}: {}", save_path, e);
                }
            }
            return AssetOutcome::Failed(AssetError::Write {
                path: save_path,
                source,
            });
        }
        if is_new {
            self.written.borrow_mut().new_files.push(save_path.clone());
        }
        claimed.insert(save_path, request_url.clone());

        asset.set_attr(attr, &local_link);
        AssetOutcome::Processed {
            url: request_url,
            local_link,
        }
    }

    /// A `<link>` whose `rel` names a document (e.g. `canonical`) rather than
    /// a resource.
    fn is_document_link(&self, asset: &Element) -> bool {
        asset.tag() == "link"
            && self
                .settings
                .document_link_rels
                .iter()
                .any(|rel| asset.has_attr_token("rel", rel))
    }
}

/// The URL inside an attribute value. `srcset` lists candidates like
/// `a.png 1x, b.png 2x`; only the first one is mirrored.
fn link_value(attr: &str, value: &str) -> String {
    let value = value.trim();
    if attr != "srcset" {
        return value.to_string();
    }
    value
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}
