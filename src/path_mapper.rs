use std::path::{Path, PathBuf};
use url::Url;

use crate::url_utils;

/// Flat file name for an asset.
///
/// Same flattening as page names, but the real extension (or none) is kept;
/// `.html` is never forced onto a binary resource.
pub fn asset_file_name(absolute_asset_url: &str) -> String {
    url_utils::flatten(absolute_asset_url)
}

/// Link written back into the document: `<assets dir>/<flat name>`.
///
/// Always `/`-separated, whatever the host platform, since it ends up in HTML.
pub fn local_link_for(absolute_asset_url: &str, assets_dir_name: &str) -> String {
    format!("{}/{}", assets_dir_name, asset_file_name(absolute_asset_url))
}

/// Where on disk the asset is written.
pub fn save_location_for(
    absolute_asset_url: &str,
    destination_dir: &Path,
    assets_dir_name: &str,
) -> PathBuf {
    destination_dir
        .join(assets_dir_name)
        .join(asset_file_name(absolute_asset_url))
}

/// URL used to name an asset that is really a linked document.
///
/// An extensionless reference recognized as a document link (for example
/// `<link rel="canonical">`) is saved as `<url>.html`. Every other asset keeps
/// its URL as is. The suffix goes on the path, so a query or fragment does
/// not swallow it.
pub fn document_link_url(absolute_asset_url: &str, is_document_link: bool) -> String {
    if !is_document_link || !url_utils::extension(absolute_asset_url).is_empty() {
        return absolute_asset_url.to_string();
    }

    match Url::parse(absolute_asset_url) {
        Ok(mut url) => {
            let path = format!("{}.html", url.path().trim_end_matches('/'));
            url.set_path(&path);
            url.to_string()
        }
        Err(_) => format!("{}.html", absolute_asset_url.trim_end_matches('/')),
    }
}
