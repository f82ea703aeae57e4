pub mod assets;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod file_manager;
pub mod html_parser;
pub mod path_mapper;
pub mod progress;
pub mod resolver;
pub mod target;
pub mod url_utils;

// Re-export main types for convenience
pub use assets::{AssetOutcome, AssetPipeline, AssetReport, SkipReason};
pub use cli::PageLoaderCommand;
pub use config::Settings;
pub use downloader::{download, PageLoader};
pub use error::{Error, Result};
pub use fetcher::{Fetch, FetchError, HttpFetcher};
pub use html_parser::HtmlDocument;
pub use progress::{NoProgress, ProgressEvent, ProgressObserver, SpinnerProgress};
pub use target::PageTarget;
