//! Page discovery and generation for the synced content directory.
//!
//! The site generator globs the content directory for markdown; this module
//! does the same walk, computes each page's slug and title the way the
//! generator does, and writes two manifests next to its config:
//! `pages.json` and `navigation-order.json`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::contract::SyncError;
use crate::preprocess::{read_lossy, write_atomic};

pub const PAGE_EXTENSIONS: [&str; 2] = ["md", "mdx"];
pub const PAGES_MANIFEST: &str = "pages.json";
pub const NAVIGATION_MANIFEST: &str = "navigation-order.json";

/// A renderable document found in the content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// Path relative to the content directory.
    pub relative_path: PathBuf,
    pub front_matter: FrontMatter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    #[serde(rename = "metaTitle")]
    pub meta_title: Option<String>,
    #[serde(rename = "metaDescription")]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub source: String,
}

#[derive(Debug, Serialize)]
struct PagesManifest<'a> {
    path_prefix: &'a str,
    pages: &'a [Page],
}

/// Walks `content_dir` for `.md`/`.mdx` files, sorted by relative path.
pub fn discover_units(content_dir: &Path) -> Result<Vec<PageSource>, SyncError> {
    if !content_dir.is_dir() {
        warn!(path = %content_dir.display(), "Content directory missing, no pages to discover");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            SyncError::io(content_dir, io)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_page = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| PAGE_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if !is_page {
            continue;
        }
        let text = match read_lossy(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable page");
                continue;
            }
        };
        let relative_path = path.strip_prefix(content_dir).unwrap_or(path).to_path_buf();
        debug!(page = %relative_path.display(), "Discovered page");
        found.push(PageSource {
            front_matter: parse_front_matter(&text),
            relative_path,
        });
    }
    found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(count = found.len(), "Discovered renderable pages");
    Ok(found)
}

/// Builds [`Page`]s and writes `pages.json` and `navigation-order.json`.
pub fn generate_pages(sources: Vec<PageSource>, site: &SiteConfig) -> Result<Vec<Page>, SyncError> {
    let pages: Vec<Page> = sources.into_iter().map(|s| to_page(s, site)).collect();

    std::fs::create_dir_all(&site.manifest_dir).map_err(|e| SyncError::io(&site.manifest_dir, e))?;

    let manifest = PagesManifest {
        path_prefix: &site.path_prefix,
        pages: &pages,
    };
    write_json(&site.manifest_dir.join(PAGES_MANIFEST), &manifest)?;
    write_json(
        &site.manifest_dir.join(NAVIGATION_MANIFEST),
        &navigation_order(&pages),
    )?;

    info!(
        pages = pages.len(),
        manifest_dir = %site.manifest_dir.display(),
        "Generated page manifests"
    );
    Ok(pages)
}

fn to_page(source: PageSource, site: &SiteConfig) -> Page {
    let stem = source
        .relative_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = source
        .front_matter
        .title
        .clone()
        .unwrap_or_else(|| start_case(&stem));
    Page {
        slug: slug_for(&source.relative_path, site.trailing_slash),
        title,
        meta_title: source.front_matter.meta_title,
        meta_description: source.front_matter.meta_description,
        source: path_to_slash(&source.relative_path),
    }
}

/// `/` first, then every other slug in discovery order.
pub fn navigation_order(pages: &[Page]) -> Vec<String> {
    let mut order = vec!["/".to_string()];
    order.extend(
        pages
            .iter()
            .map(|p| p.slug.clone())
            .filter(|s| s != "/"),
    );
    order
}

/// Relative path without its extension; a top-level `index` maps to the root.
pub fn slug_for(relative_path: &Path, trailing_slash: bool) -> String {
    let mut value = path_to_slash(&relative_path.with_extension(""));
    if value == "index" {
        value.clear();
    }
    match (trailing_slash, value.is_empty()) {
        (_, true) => "/".to_string(),
        (true, false) => format!("/{value}/"),
        (false, false) => format!("/{value}"),
    }
}

fn path_to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parses a leading `---` YAML block. Anything malformed yields empty front matter.
pub fn parse_front_matter(text: &str) -> FrontMatter {
    let Some(rest) = text.strip_prefix("---\n").or_else(|| text.strip_prefix("---\r\n")) else {
        return FrontMatter::default();
    };
    let end = rest
        .find("\n---\n")
        .or_else(|| rest.find("\n---\r\n"))
        .or_else(|| rest.strip_suffix("\n---").map(|s| s.len()));
    let Some(end) = end else {
        return FrontMatter::default();
    };
    match serde_yaml::from_str::<FrontMatter>(&rest[..end]) {
        Ok(fm) => fm,
        Err(e) => {
            warn!(error = %e, "Ignoring unparsable front matter");
            FrontMatter::default()
        }
    }
}

/// `prompt_chaining` → `Prompt Chaining`, `chapter01` → `Chapter 01`, `HTMLParser` → `HTML Parser`.
pub fn start_case(input: &str) -> String {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    let words = WORDS.get_or_init(|| {
        Regex::new(r"\p{Lu}+\p{Ll}*|\p{Ll}+|\p{Lo}+|\p{N}+").expect("static regex")
    });
    words
        .find_iter(input)
        .flat_map(|m| split_acronym(m.as_str()))
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `HTMLParser` → [`HTML`, `Parser`]: the last capital of a run starts the next word.
fn split_acronym(word: &str) -> Vec<&str> {
    let upper: Vec<(usize, char)> = word
        .char_indices()
        .take_while(|(_, c)| c.is_uppercase())
        .collect();
    let has_tail = upper.len() < word.chars().count();
    match upper.last() {
        Some(&(at, _)) if upper.len() >= 2 && has_tail => vec![&word[..at], &word[at..]],
        _ => vec![word],
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SyncError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| SyncError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}
