use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::RouteError;

/// Directory marker stripped from the front of every page path.
pub const DEFAULT_PAGES_MARKER: &str = "/pages";

/// Page component file suffix.
pub const DEFAULT_PAGE_SUFFIX: &str = ".vue";

/// Where the application root redirects to.
pub const DEFAULT_LANDING_PATH: &str = "/app/auth/login";

/// Trailing segment naming a directory's default page.
const INDEX_SEGMENT: &str = "/index";

static PARAM_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("static regex is valid"));

/// What a route resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RouteTarget {
    /// A page component, identified by its source path.
    Component(String),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub path: String,
    pub target: RouteTarget,
}

/// A route matched against a concrete URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: BTreeMap<String, String>,
}

/// Builds the route table from page identifiers.
///
/// Each identifier is a path such as `/src/pages/users/[id]/index.vue`.
/// It is rewritten by stripping everything through the pages marker and the
/// file suffix, turning `[param]` into `:param`, and collapsing a trailing
/// `/index` onto its directory.
#[derive(Debug, Clone)]
pub struct RouteTableBuilder {
    pages_marker: String,
    suffix: String,
    landing_path: String,
}

impl Default for RouteTableBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PAGES_MARKER, DEFAULT_PAGE_SUFFIX, DEFAULT_LANDING_PATH)
    }
}

impl RouteTableBuilder {
    pub fn new(pages_marker: &str, suffix: &str, landing_path: &str) -> Self {
        Self {
            pages_marker: pages_marker.to_string(),
            suffix: suffix.to_string(),
            landing_path: landing_path.to_string(),
        }
    }

    pub fn with_landing_path(mut self, landing_path: impl Into<String>) -> Self {
        self.landing_path = landing_path.into();
        self
    }

    /// Rewrite one page identifier into its URL path.
    pub fn route_path(&self, page: &str) -> String {
        // Everything up to the last occurrence of the marker goes
        let relative = match page.rfind(self.pages_marker.as_str()) {
            Some(at) => &page[at + self.pages_marker.len()..],
            None => page,
        };
        let stem = relative.strip_suffix(self.suffix.as_str()).unwrap_or(relative);
        let path = PARAM_SEGMENT.replace_all(stem, ":$1").into_owned();

        let cut = path.len().saturating_sub(INDEX_SEGMENT.len());
        let is_index = path
            .get(cut..)
            .map(|tail| tail.eq_ignore_ascii_case(INDEX_SEGMENT))
            .unwrap_or(false);
        let path = if is_index { path[..cut].to_string() } else { path };

        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }

    /// Build a table from page identifiers, sorted so first-match-wins
    /// routing is stable, followed by the root redirect.
    pub fn build<I, S>(&self, pages: I) -> RouteTable
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pages: Vec<String> = pages.into_iter().map(Into::into).collect();
        pages.sort();
        pages.dedup();

        let mut entries: Vec<RouteEntry> = pages
            .into_iter()
            .map(|page| RouteEntry {
                path: self.route_path(&page),
                target: RouteTarget::Component(page),
            })
            .collect();

        entries.push(RouteEntry {
            path: "/".to_string(),
            target: RouteTarget::Redirect(self.landing_path.clone()),
        });

        debug!(routes = entries.len(), "Route table built");
        RouteTable { entries }
    }

    /// Walk a pages directory and collect identifiers for every page file,
    /// in the same `/pages/...` form the bundler glob produces.
    pub fn discover(&self, pages_dir: &Path) -> Result<Vec<String>, RouteError> {
        let mut pages = Vec::new();
        self.walk(pages_dir, pages_dir, &mut pages)?;
        pages.sort();
        Ok(pages)
    }

    /// `discover` followed by `build`.
    pub fn build_from_dir(&self, pages_dir: &Path) -> Result<RouteTable, RouteError> {
        Ok(self.build(self.discover(pages_dir)?))
    }

    fn walk(&self, root: &Path, dir: &Path, pages: &mut Vec<String>) -> Result<(), RouteError> {
        let entries = std::fs::read_dir(dir).map_err(|e| RouteError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RouteError::io(dir, e))?;
            let path = entry.path();
            // Symlinked directories are not followed
            let file_type = entry.file_type().map_err(|e| RouteError::io(&path, e))?;
            if file_type.is_dir() {
                self.walk(root, &path, pages)?;
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "Skipping page with non UTF-8 name");
                continue;
            };
            if !name.ends_with(self.suffix.as_str()) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            pages.push(format!("{}/{}", self.pages_marker, segments.join("/")));
        }
        Ok(())
    }
}

/// Ordered route entries. The first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first entry matching a concrete path, binding `:param` segments.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let wanted: Vec<&str> = split_segments(path);
        self.entries.iter().find_map(|entry| {
            let pattern = split_segments(&entry.path);
            if pattern.len() != wanted.len() {
                return None;
            }
            let mut params = BTreeMap::new();
            for (pat, seg) in pattern.iter().zip(&wanted) {
                match pat.strip_prefix(':') {
                    Some(name) => {
                        params.insert(name.to_string(), seg.to_string());
                    }
                    None if pat == seg => {}
                    None => return None,
                }
            }
            Some(RouteMatch { entry, params })
        })
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_rewrites() {
        let builder = RouteTableBuilder::default();
        assert_eq!(builder.route_path("/src/pages/users/[id]/index.vue"), "/users/:id");
        assert_eq!(builder.route_path("/src/pages/about.vue"), "/about");
        assert_eq!(builder.route_path("/pages/about.vue"), "/about");
        assert_eq!(builder.route_path("/src/pages/app/auth/login.vue"), "/app/auth/login");
        assert_eq!(
            builder.route_path("/src/pages/orgs/[org]/repos/[repo].vue"),
            "/orgs/:org/repos/:repo"
        );
    }

    #[test]
    fn test_route_path_index_is_case_insensitive() {
        let builder = RouteTableBuilder::default();
        assert_eq!(builder.route_path("/src/pages/reports/Index.vue"), "/reports");
        assert_eq!(builder.route_path("/src/pages/index.vue"), "/");
        // Only a whole trailing segment collapses
        assert_eq!(builder.route_path("/src/pages/reindex.vue"), "/reindex");
    }

    #[test]
    fn test_build_is_sorted_with_root_redirect_last() {
        let builder = RouteTableBuilder::default();
        let table = builder.build(vec![
            "/src/pages/users/index.vue",
            "/src/pages/about.vue",
            "/src/pages/users/[id]/index.vue",
        ]);

        let paths: Vec<&str> = table.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/about", "/users/:id", "/users", "/"]);

        let last = table.entries().last().unwrap();
        assert_eq!(last.target, RouteTarget::Redirect("/app/auth/login".to_string()));
    }

    #[test]
    fn test_build_is_deterministic_regardless_of_input_order() {
        let builder = RouteTableBuilder::default();
        let a = builder.build(vec!["/pages/b.vue", "/pages/a.vue"]);
        let b = builder.build(vec!["/pages/a.vue", "/pages/b.vue"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_binds_params() {
        let table = RouteTableBuilder::default().build(vec![
            "/pages/users/[id]/index.vue",
            "/pages/users/new.vue",
        ]);

        let m = table.resolve("/users/42").unwrap();
        assert_eq!(m.entry.path, "/users/:id");
        assert_eq!(m.params.get("id").map(String::as_str), Some("42"));

        // First match wins: "new" is captured by the param route, sorted first
        let m = table.resolve("/users/new").unwrap();
        assert_eq!(m.entry.path, "/users/:id");

        let root = table.resolve("/").unwrap();
        assert!(matches!(root.entry.target, RouteTarget::Redirect(_)));
        assert!(table.resolve("/nope").is_none());
    }

    #[test]
    fn test_discover_walks_pages_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let pages = tmp.path().join("pages");
        std::fs::create_dir_all(pages.join("users/[id]")).unwrap();
        std::fs::write(pages.join("about.vue"), "").unwrap();
        std::fs::write(pages.join("users/[id]/index.vue"), "").unwrap();
        std::fs::write(pages.join("users/notes.txt"), "").unwrap();

        let builder = RouteTableBuilder::default();
        let found = builder.discover(&pages).unwrap();
        assert_eq!(found, vec!["/pages/about.vue", "/pages/users/[id]/index.vue"]);

        let table = builder.build_from_dir(&pages).unwrap();
        let paths: Vec<&str> = table.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/about", "/users/:id", "/"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinked_dir_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let pages = tmp.path().join("pages");
        std::fs::create_dir_all(pages.join("blog")).unwrap();
        std::fs::write(pages.join("blog/post.vue"), "").unwrap();
        std::os::unix::fs::symlink(&pages, pages.join("blog/loop")).unwrap();

        let found = RouteTableBuilder::default().discover(&pages).unwrap();
        assert_eq!(found, vec!["/pages/blog/post.vue"]);
    }

    #[test]
    fn test_discover_missing_dir_errors() {
        let builder = RouteTableBuilder::default();
        let err = builder.discover(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here"));
    }
}
