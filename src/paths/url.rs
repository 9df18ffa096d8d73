//! Url computations relative to the document being compiled.
//!
//! Every function here is pure: its output depends only on the [`UrlResolver`] fields (the current
//! document's canonical name, the output directory, and the optional url override) and on its
//! argument.
//!
//! Paths use `/` as separator regardless of host OS. A url is *rooted* when it starts with `/`,
//! meaning it is relative to the corpus root rather than to the current document's directory.

use url::Url;

/// Split `url` into its path part and its `#fragment` (fragment returned without the `#`).
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    }
}

/// Schemes written without `//` that still point outside the corpus.
const OPAQUE_SCHEMES: &[&str] = &["data", "javascript", "mailto", "news", "sms", "tel", "urn"];

/// True when `url` carries a scheme (`https://`, `mailto:`, ...) and so points outside the corpus.
///
/// Only hierarchical urls (`scheme://`) and the well known opaque schemes count. Any other
/// `name:rest` is a document name containing a colon.
pub fn has_scheme(url: &str) -> bool {
    let url = url.trim();
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let scheme = parsed.scheme();
    url.get(scheme.len()..)
        .is_some_and(|rest| rest.starts_with("://"))
        || OPAQUE_SCHEMES.contains(&scheme)
}

/// Resolve `.` and `..` segments and drop empty segments.
///
/// Returns `None` when a `..` would climb above the root of `path`.
pub fn normalize(path: &str) -> Option<String> {
    let mut components: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop()?;
            }
            _ => components.push(part),
        }
    }
    Some(components.join("/"))
}

/// Parent directory of a `/` separated path, `""` for top level entries.
pub fn dir_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rfind('/')
        .map(|idx| &path[..idx])
        .unwrap_or("")
}

/// Path to walk from directory `from_dir` to `to_path`, both relative to the same root.
fn path_between(from_dir: &str, to_path: &str) -> String {
    let from_parts: Vec<&str> = from_dir.split('/').filter(|p| !p.is_empty()).collect();
    let to_parts: Vec<&str> = to_path.split('/').filter(|p| !p.is_empty()).collect();

    // The last element of to_parts is the file itself and never part of the shared prefix.
    let dir_len = to_parts.len().saturating_sub(1);
    let common_len = from_parts
        .iter()
        .zip(to_parts[..dir_len].iter())
        .take_while(|(from, to)| from == to)
        .count();

    let mut result: Vec<&str> = vec![".."; from_parts.len() - common_len];
    result.extend_from_slice(&to_parts[common_len..]);
    result.join("/")
}

/// Url context for one document compile pass.
#[derive(Debug, Clone, Copy)]
pub struct UrlResolver<'a> {
    file_name: &'a str,
    target_directory: &'a str,
    url_override: Option<&'a str>,
}

impl<'a> UrlResolver<'a> {
    pub fn new(
        file_name: &'a str,
        target_directory: &'a str,
        url_override: Option<&'a str>,
    ) -> UrlResolver<'a> {
        UrlResolver {
            file_name,
            target_directory,
            url_override,
        }
    }

    /// Directory of the current document, relative to the corpus root.
    pub fn dir_name(&self) -> &'a str {
        dir_name(self.file_name)
    }

    /// Output url of the current document: the override when set, the file name otherwise.
    pub fn url(&self) -> &'a str {
        self.url_override.unwrap_or(self.file_name)
    }

    /// Dependency graph key for `url`.
    ///
    /// Rooted urls are taken relative to the corpus root, everything else relative to the current
    /// document's directory. Any `#fragment` is dropped since it names a location inside the same
    /// file. Returns `None` for empty input, for urls with a scheme, and for paths that climb out of
    /// the corpus root.
    pub fn canonical_url(&self, url: &str) -> Option<String> {
        let (path, _fragment) = split_fragment(url.trim());
        if path.is_empty() || has_scheme(path) {
            return None;
        }
        let joined = match path.strip_prefix('/') {
            Some(rooted) => rooted.to_string(),
            None => format!("{}/{}", self.dir_name(), path),
        };
        let canonical = normalize(&joined)?;
        if canonical.is_empty() {
            return None;
        }
        Some(canonical)
    }

    /// Rooted form of `url`. Urls with a scheme and already rooted urls pass through unchanged.
    pub fn absolute_url(&self, url: &str) -> String {
        if has_scheme(url) || url.starts_with('/') {
            return url.to_string();
        }
        let (_, fragment) = split_fragment(url);
        match self.canonical_url(url) {
            Some(canonical) => with_fragment(format!("/{canonical}"), fragment),
            None => url.to_string(),
        }
    }

    /// Form of `url` usable from the current document's output location.
    ///
    /// Rooted urls are rewritten to a path relative to the current document's directory. Urls
    /// with a scheme and urls that are already relative pass through unchanged.
    pub fn relative_url(&self, url: &str) -> String {
        if has_scheme(url) {
            return url.to_string();
        }
        let Some(rooted) = url.strip_prefix('/') else {
            return url.to_string();
        };
        let (path, fragment) = split_fragment(rooted);
        let Some(target) = normalize(path) else {
            return url.to_string();
        };
        if target.is_empty() {
            return url.to_string();
        }
        let current_dir = dir_name(self.url());
        with_fragment(path_between(current_dir, &target), fragment)
    }

    /// Location of `path` inside the output tree.
    pub fn generate_url(&self, path: &str) -> Option<String> {
        let canonical = self.canonical_url(path)?;
        let target = self.target_directory.trim_end_matches('/');
        Some(if target.is_empty() {
            canonical
        } else {
            format!("{target}/{canonical}")
        })
    }
}

fn with_fragment(path: String, fragment: Option<&str>) -> String {
    match fragment {
        Some(fragment) if !fragment.is_empty() => format!("{path}#{fragment}"),
        _ => path,
    }
}
