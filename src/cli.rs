use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "page-loader",
    about = "Download a web page together with its images, stylesheets and scripts",
    version,
    long_about = "Downloads a single web page, saves its same-origin assets into a sibling <page>_files directory and rewrites the page's links to point at the local copies."
)]
pub struct PageLoaderCommand {
    /// The URL of the page to download
    #[arg(required = true)]
    pub url: String,

    /// Directory to save the page into (must exist; defaults to the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON settings file (asset_tags, ignore_other_hosts, prettify, ...)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Timeout for requests in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Log every step to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = PageLoaderCommand::try_parse_from([
            "page-loader",
            "https://example.com",
            "-o", "./output"
        ]).unwrap();

        assert_eq!(args.url, "https://example.com");
        assert_eq!(args.output, Some(PathBuf::from("./output")));
        assert_eq!(args.settings, None);
        assert_eq!(args.timeout, None);
        assert!(!args.no_progress);
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_all_args() {
        let args = PageLoaderCommand::try_parse_from([
            "page-loader",
            "https://example.com",
            "--output", "./output",
            "--settings", "settings.json",
            "-t", "5",
            "--no-progress",
            "-v"
        ]).unwrap();

        assert_eq!(args.output, Some(PathBuf::from("./output")));
        assert_eq!(args.settings, Some(PathBuf::from("settings.json")));
        assert_eq!(args.timeout, Some(5));
        assert!(args.no_progress);
        assert!(args.verbose);
    }

    #[test]
    fn test_output_is_optional() {
        let args = PageLoaderCommand::try_parse_from([
            "page-loader",
            "https://example.com"
        ]).unwrap();

        assert_eq!(args.output, None);
    }

    #[test]
    fn test_parse_missing_url() {
        let result = PageLoaderCommand::try_parse_from([
            "page-loader",
            "-o", "./output"
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_timeout() {
        let result = PageLoaderCommand::try_parse_from([
            "page-loader",
            "https://example.com",
            "-t", "0"
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_flag() {
        let err = PageLoaderCommand::try_parse_from(["page-loader", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
