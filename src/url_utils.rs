use std::path::Path;
use url::Url;

/// The pieces of a (possibly partial) URL the rest of the crate cares about.
///
/// Absolute URLs go through the `url` crate, so their path comes back
/// normalized (`..` and `.` segments collapsed, unsafe characters encoded).
/// Anything `Url::parse` rejects is treated as a relative reference whose
/// path is everything up to the query or fragment.
struct UrlParts {
    scheme: String,
    authority: String,
    path: String,
}

fn split(url: &str) -> UrlParts {
    if let Some(rest) = url.strip_prefix("//") {
        // Scheme-relative: borrow a scheme just to parse the authority
        if let Ok(parsed) = Url::parse(&format!("http://{}", rest)) {
            return UrlParts {
                scheme: String::new(),
                authority: authority_of(&parsed),
                path: parsed.path().to_string(),
            };
        }
    }

    match Url::parse(url) {
        Ok(parsed) => UrlParts {
            scheme: parsed.scheme().to_string(),
            authority: authority_of(&parsed),
            path: parsed.path().to_string(),
        },
        Err(_) => UrlParts {
            scheme: String::new(),
            authority: String::new(),
            path: url
                .split(|c| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string(),
        },
    }
}

fn authority_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// URI scheme, or an empty string for relative references.
pub fn scheme(url: &str) -> String {
    split(url).scheme
}

/// Network authority (`host[:port]`), or an empty string when there is none.
pub fn domain(url: &str) -> String {
    split(url).authority
}

/// `scheme://domain`, or an empty string when the URL has no domain.
pub fn full_domain(url: &str) -> String {
    let parts = split(url);
    if parts.authority.is_empty() {
        return String::new();
    }
    format!("{}://{}", parts.scheme, parts.authority)
}

/// True for root-relative references such as `/assets/app.js`.
pub fn is_absolute_path(url: &str) -> bool {
    url.starts_with('/')
}

/// Extension of the URL's path component, without the leading dot.
pub fn extension(url: &str) -> String {
    let path = split(url).path;
    let file_name = path.rsplit('/').next().unwrap_or_default();
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory of the page URL, used to resolve document-relative references.
///
/// Extensionless paths are directories (`/courses` -> `/courses/`), paths
/// carrying a file name lose it (`/site/index.html` -> `/site/`). The result
/// always ends with `/`.
pub fn base_url(url: &str) -> String {
    let parts = split(url);
    if parts.authority.is_empty() {
        return String::new();
    }

    let directory = if extension(url).is_empty() {
        format!("{}/", parts.path.trim_end_matches('/'))
    } else {
        match parts.path.rfind('/') {
            Some(idx) => parts.path[..=idx].to_string(),
            None => "/".to_string(),
        }
    };

    format!("{}://{}{}", parts.scheme, parts.authority, directory)
}

/// Host and path flattened into a single name: dots in the host and slashes
/// in the path become `-`. Query and fragment never take part.
pub(crate) fn flatten(url: &str) -> String {
    let parts = split(url);
    let host = parts.authority.replace(['.', ':'], "-");
    let path = parts.path.replace('/', "-");
    format!("{}{}", host, path.trim_end_matches('-'))
}

/// Flat, filesystem-safe file name for a page URL.
///
/// Leading slashes are dropped and `.html` is appended unless the path
/// already ends in an extension.
pub fn file_name_from_url(url: &str) -> String {
    let url = url.trim_start_matches('/');
    let name = flatten(url);
    if extension(url).is_empty() {
        format!("{}.html", name)
    } else {
        name
    }
}

/// Directory name for a page's assets: the page file name without its
/// extension, plus `_` and `suffix`.
///
/// Only the last dot starts the extension, so `page.v2.html` keeps `page.v2`.
pub fn dirname_for_assets(page_file_name: &str, suffix: &str) -> String {
    let stem = match page_file_name.rfind('.') {
        Some(idx) if idx > 0 => &page_file_name[..idx],
        _ => page_file_name,
    };
    format!("{}_{}", stem, suffix)
}
