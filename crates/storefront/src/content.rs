//! Markdown content pages (about, contact, policies, size guide).
//!
//! Pages are loaded from `content/pages/*.md` at startup. Each file starts
//! with YAML frontmatter:
//!
//! ```markdown
//! ---
//! title: Shipping Policy
//! description: Delivery times and charges
//! updated_at: 2025-01-01
//! footer_order: 3
//! ---
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Frontmatter of a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
    /// Position in the footer link list; pages without one are not linked.
    #[serde(default)]
    pub footer_order: Option<u32>,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// All pages, rendered once and shared.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every `*.md` file in `content_dir/pages`.
    ///
    /// A missing directory yields an empty store; a page that fails to parse
    /// is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        if !dir.exists() {
            tracing::warn!("Pages directory does not exist: {:?}", dir);
            return Ok(Self::default());
        }

        let mut pages = HashMap::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            match load_page(&path) {
                Ok(page) => {
                    tracing::info!("Loaded page: {}", page.slug);
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => tracing::error!("Failed to load page {:?}: {}", path, e),
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Build a store from in-memory sources.
    ///
    /// # Errors
    ///
    /// Returns the first parse error.
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ContentError> {
        let pages = sources
            .into_iter()
            .map(|(slug, source)| parse_page(slug, source).map(|page| (page.slug.clone(), page)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Pages linked from the footer, in `footer_order`.
    #[must_use]
    pub fn footer_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .pages
            .values()
            .filter(|p| p.meta.footer_order.is_some())
            .collect();
        pages.sort_by_key(|p| (p.meta.footer_order, p.slug.clone()));
        pages
    }
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let source = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;
    parse_page(slug, &source)
}

fn parse_page(slug: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse(format!("Missing frontmatter in {slug}")))?;

    Ok(Page {
        slug: slug.to_string(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SIZE_GUIDE: &str = "---\ntitle: Size Guide\nfooter_order: 2\n---\n\n## Frame width\n\n| Size | Width |\n|---|---|\n| M | 130mm |\n";
    const STORY: &str = "---\ntitle: Our Story\ndescription: How Eyeric started\nupdated_at: 2025-02-01\nfooter_order: 1\n---\n\nWe make *honest* eyewear.\n";
    const DRAFT: &str = "---\ntitle: Careers\n---\n\nSoon.\n";

    #[test]
    fn test_parse_page_renders_markdown() {
        let page = parse_page("story", STORY).unwrap();
        assert_eq!(page.meta.title, "Our Story");
        assert_eq!(page.meta.updated_at, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert!(page.content_html.contains("<em>honest</em>"));
    }

    #[test]
    fn test_tables_are_rendered() {
        let page = parse_page("size-guide", SIZE_GUIDE).unwrap();
        assert!(page.content_html.contains("<table>"));
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        assert!(matches!(
            parse_page("bare", "Just text"),
            Err(ContentError::Parse(_))
        ));
    }

    #[test]
    fn test_footer_pages_ordered() {
        let store = ContentStore::from_sources([
            ("size-guide", SIZE_GUIDE),
            ("story", STORY),
            ("careers", DRAFT),
        ])
        .unwrap();

        let slugs: Vec<_> = store.footer_pages().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["story", "size-guide"]);
        assert!(store.get_page("careers").is_some());
        assert!(store.get_page("missing").is_none());
    }
}
