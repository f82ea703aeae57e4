use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::assets::AssetPipeline;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::fetcher::{Fetch, FetchError, HttpFetcher};
use crate::file_manager::FileManager;
use crate::html_parser::HtmlDocument;
use crate::progress::{NoProgress, ProgressEvent, ProgressObserver};
use crate::target::PageTarget;

/// Downloads one page and its assets into a directory.
pub struct PageLoader<F = HttpFetcher> {
    fetcher: F,
    settings: Settings,
    observer: Box<dyn ProgressObserver>,
}

impl PageLoader<HttpFetcher> {
    pub fn new(settings: Settings) -> std::result::Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::new(&settings)?;
        Ok(Self::with_fetcher(fetcher, settings))
    }
}

impl<F: Fetch> PageLoader<F> {
    pub fn with_fetcher(fetcher: F, settings: Settings) -> Self {
        Self {
            fetcher,
            settings,
            observer: Box::new(NoProgress),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Saves `url` as `<output_dir>/<flat name>.html`, assets next to it in
    /// `<flat name>_files/`, and returns the page's path.
    ///
    /// `output_dir` defaults to the working directory and must exist. Either
    /// the page is saved, or neither the page nor its assets directory is
    /// left behind.
    pub async fn download(&self, url: &str, output_dir: Option<&Path>) -> Result<PathBuf> {
        let target = PageTarget::new(url, &output_dir_for(output_dir)?, &self.settings.assets_dir_suffix)?;
        info!("Start download from '{}'", url);

        let body = self.fetcher.fetch(url).await.map_err(|e| match e {
            FetchError::Status { url, status } => Error::Http { url, status },
            FetchError::Request { url, source } => Error::Request { url, source },
        })?;
        self.observer.notify(ProgressEvent::PageFetched {
            url: url.to_string(),
            bytes: body.len(),
        });

        let mut document = HtmlDocument::parse(&body);
        let pipeline = AssetPipeline::new(&self.fetcher, &self.settings, &target, self.observer.as_ref());
        let report = pipeline.process_assets(&mut document).await;
        debug!(
            "Assets for {}: {} saved, {} skipped, {} failed",
            url,
            report.processed(),
            report.skipped(),
            report.failed()
        );

        let file_manager = FileManager::new(target.output_dir());
        let saved = document
            .render(self.settings.prettify)
            .and_then(|content| file_manager.save_text(target.page_file_name(), &content));

        match saved {
            Ok(path) => {
                info!("Page content from '{}' saved to {:?}", url, path);
                self.observer.notify(ProgressEvent::PageSaved { path: path.clone() });
                Ok(path)
            }
            Err(source) => {
                pipeline.rollback();
                Err(Error::Save {
                    path: target.page_path(),
                    source,
                })
            }
        }
    }
}

/// Absolute destination directory; it has to exist already.
fn output_dir_for(output_dir: Option<&Path>) -> Result<PathBuf> {
    let requested = output_dir.filter(|dir| !dir.as_os_str().is_empty());
    let dir = match requested {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        _ => {
            let cwd = env::current_dir().map_err(|_| Error::Directory {
                path: requested.unwrap_or(Path::new(".")).to_path_buf(),
            })?;
            requested.map(|dir| cwd.join(dir)).unwrap_or(cwd)
        }
    };

    if !dir.is_dir() {
        return Err(Error::Directory { path: dir });
    }
    Ok(dir)
}

/// Downloads `url` into `output_dir` with default settings.
pub async fn download(url: &str, output_dir: Option<&Path>) -> Result<PathBuf> {
    let loader = PageLoader::new(Settings::default()).map_err(|e| Error::Request {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    loader.download(url, output_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use crate::progress::MockProgressObserver;
    use std::fs;
    use tempfile::tempdir;

    const PAGE_URL: &str = "https://example.test/courses";
    const PAGE_HTML: &str =
        r#"<html><head><title>Courses</title></head><body><img src="/img/a.png"></body></html>"#;

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn page_fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .with_body(PAGE_URL, PAGE_HTML)
            .with_body("https://example.test/img/a.png", b"\x89PNG-a".to_vec())
    }

    #[tokio::test]
    async fn test_download_saves_page_and_assets() {
        let temp_dir = tempdir().unwrap();
        let loader = PageLoader::with_fetcher(page_fetcher(), Settings::default());

        let saved = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap();

        assert_eq!(saved, temp_dir.path().join("example-test-courses.html"));
        let html = fs::read_to_string(&saved).unwrap();
        assert!(html.contains(r#"src="example-test-courses_files/example-test-img-a.png""#));
        assert!(!html.contains(r#"src="/img/a.png""#));
        assert_eq!(
            fs::read(
                temp_dir
                    .path()
                    .join("example-test-courses_files")
                    .join("example-test-img-a.png")
            )
            .unwrap(),
            b"\x89PNG-a"
        );
    }

    #[tokio::test]
    async fn test_prettified_page() {
        let temp_dir = tempdir().unwrap();
        let settings = Settings {
            prettify: true,
            ..Settings::default()
        };
        let loader = PageLoader::with_fetcher(page_fetcher(), settings);

        let saved = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap();

        let html = fs::read_to_string(saved).unwrap();
        assert!(html.starts_with("<html>\n <head>\n  <title>\n   Courses\n"));
        assert!(html.contains("  <img src=\"example-test-courses_files/example-test-img-a.png\">\n"));
    }

    #[tokio::test]
    async fn test_missing_output_directory_sends_no_request() {
        let fetcher = page_fetcher();
        let loader = PageLoader::with_fetcher(fetcher, Settings::default());

        let err = loader
            .download(PAGE_URL, Some(Path::new("/no/such/dir")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Directory { ref path } if path == Path::new("/no/such/dir")));
        assert!(loader.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_http_error_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let fetcher = StaticFetcher::new().with_status(PAGE_URL, 404);
        let loader = PageLoader::with_fetcher(fetcher, Settings::default());

        let err = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap_err();

        assert!(matches!(err, Error::Http { status: 404, .. }));
        assert!(listing(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_request_error() {
        let temp_dir = tempdir().unwrap();
        let loader = PageLoader::with_fetcher(StaticFetcher::new(), Settings::default());

        let err = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap_err();

        assert!(matches!(err, Error::Request { ref url, .. } if url == PAGE_URL));
        assert_eq!(err.exit_code(), crate::error::exit_code::UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_invalid_url_sends_no_request() {
        let temp_dir = tempdir().unwrap();
        let loader = PageLoader::with_fetcher(page_fetcher(), Settings::default());

        let err = loader
            .download("example.test/courses", Some(temp_dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(loader.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_leaves_directory_unchanged() {
        let temp_dir = tempdir().unwrap();
        let page_path = temp_dir.path().join("example-test-courses.html");
        fs::write(&page_path, "previous copy").unwrap();
        let mut perms = fs::metadata(&page_path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&page_path, perms).unwrap();
        let before = listing(temp_dir.path());

        let fetcher = page_fetcher();
        let loader = PageLoader::with_fetcher(fetcher, Settings::default());
        let err = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap_err();

        assert!(matches!(err, Error::Save { ref path, .. } if path == &page_path));
        // The asset was fetched, yet its directory is gone again
        assert!(loader
            .fetcher
            .requests()
            .contains(&"https://example.test/img/a.png".to_string()));
        assert_eq!(listing(temp_dir.path()), before);
        assert_eq!(fs::read_to_string(&page_path).unwrap(), "previous copy");
    }

    #[tokio::test]
    async fn test_save_failure_keeps_assets_from_earlier_runs() {
        let temp_dir = tempdir().unwrap();
        let assets = temp_dir.path().join("example-test-courses_files");
        fs::create_dir(&assets).unwrap();
        fs::write(assets.join("example-test-img-old.png"), "old").unwrap();
        let page_path = temp_dir.path().join("example-test-courses.html");
        fs::write(&page_path, "previous copy").unwrap();
        let mut perms = fs::metadata(&page_path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&page_path, perms).unwrap();
        let before = listing(temp_dir.path());

        let loader = PageLoader::with_fetcher(page_fetcher(), Settings::default());
        let err = loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap_err();

        assert!(matches!(err, Error::Save { .. }));
        assert_eq!(listing(temp_dir.path()), before);
        assert_eq!(listing(&assets), vec!["example-test-img-old.png".to_string()]);
        assert_eq!(
            fs::read_to_string(assets.join("example-test-img-old.png")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_observer_sees_each_checkpoint() {
        let temp_dir = tempdir().unwrap();
        let mut observer = MockProgressObserver::new();
        observer
            .expect_notify()
            .withf(|event| matches!(event, ProgressEvent::PageFetched { url, .. } if url == PAGE_URL))
            .times(1)
            .return_const(());
        observer
            .expect_notify()
            .withf(|event| matches!(event, ProgressEvent::AssetsFound { count: 1 }))
            .times(1)
            .return_const(());
        observer
            .expect_notify()
            .withf(|event| matches!(event, ProgressEvent::AssetDone { saved: true, .. }))
            .times(1)
            .return_const(());
        observer
            .expect_notify()
            .withf(|event| matches!(event, ProgressEvent::PageSaved { .. }))
            .times(1)
            .return_const(());

        let loader = PageLoader::with_fetcher(page_fetcher(), Settings::default())
            .with_observer(Box::new(observer));
        loader.download(PAGE_URL, Some(temp_dir.path())).await.unwrap();
    }

    #[test]
    fn test_output_dir_for() {
        let temp_dir = tempdir().unwrap();
        assert_eq!(output_dir_for(Some(temp_dir.path())).unwrap(), temp_dir.path());
        assert_eq!(output_dir_for(None).unwrap(), env::current_dir().unwrap());
        assert_eq!(
            output_dir_for(Some(Path::new(""))).unwrap(),
            env::current_dir().unwrap()
        );

        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        assert!(matches!(output_dir_for(Some(file.as_path())), Err(Error::Directory { .. })));
    }
}
