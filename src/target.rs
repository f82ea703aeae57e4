use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Error, Result};
use crate::url_utils;

/// One page download: where it comes from and where it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTarget {
    url: String,
    output_dir: PathBuf,
    page_file_name: String,
    assets_dir_name: String,
    domain: String,
    full_domain: String,
    base_url: String,
}

impl PageTarget {
    /// Checks that `url` has a scheme and a host and derives the names used
    /// on disk. The output directory is not touched here.
    pub fn new(url: &str, output_dir: &Path, assets_suffix: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !parsed.has_host() {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
                reason: "URL has no host".to_string(),
            });
        }

        let page_file_name = url_utils::file_name_from_url(url);
        let assets_dir_name = url_utils::dirname_for_assets(&page_file_name, assets_suffix);

        Ok(Self {
            url: url.to_string(),
            output_dir: output_dir.to_path_buf(),
            page_file_name,
            assets_dir_name,
            domain: url_utils::domain(url),
            full_domain: url_utils::full_domain(url),
            base_url: url_utils::base_url(url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn page_file_name(&self) -> &str {
        &self.page_file_name
    }

    pub fn assets_dir_name(&self) -> &str {
        &self.assets_dir_name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn full_domain(&self) -> &str {
        &self.full_domain
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_path(&self) -> PathBuf {
        self.output_dir.join(&self.page_file_name)
    }

    pub fn assets_path(&self) -> PathBuf {
        self.output_dir.join(&self.assets_dir_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_for_directory_like_urls() {
        for url in ["https://ru.hexlet.io/courses/", "https://ru.hexlet.io/courses"] {
            let target = PageTarget::new(url, Path::new("some_path"), "files").unwrap();
            assert_eq!(target.page_path(), Path::new("some_path").join("ru-hexlet-io-courses.html"));
            assert_eq!(
                target.assets_path(),
                Path::new("some_path").join("ru-hexlet-io-courses_files")
            );
            assert_eq!(target.base_url(), "https://ru.hexlet.io/courses/");
        }
    }

    #[test]
    fn test_paths_for_file_urls() {
        let target =
            PageTarget::new("https://ru.hexlet.io/courses/main.html", Path::new("some_path"), "files")
                .unwrap();
        assert_eq!(target.page_file_name(), "ru-hexlet-io-courses-main.html");
        assert_eq!(target.assets_dir_name(), "ru-hexlet-io-courses-main_files");
        assert_eq!(target.domain(), "ru.hexlet.io");
        assert_eq!(target.full_domain(), "https://ru.hexlet.io");
    }

    #[test]
    fn test_rejects_urls_without_host() {
        for url in ["ru.hexlet.io/courses", "/courses", "mailto:team@hexlet.io"] {
            let err = PageTarget::new(url, Path::new("."), "files").unwrap_err();
            assert!(matches!(err, Error::InvalidUrl { .. }), "{}", url);
        }
    }
}
