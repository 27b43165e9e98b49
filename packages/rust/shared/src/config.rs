//! Application configuration for tutpage.
//!
//! Project config lives at `<root>/tutpage.toml`. Every field has a default,
//! so a missing file or a partial file is valid. CLI flags pick the root and
//! an alternative config path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TutpageError};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "tutpage.toml";

// ---------------------------------------------------------------------------
// Config structs (matching tutpage.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the tutorial comes from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Shape of the tutorial tree.
    #[serde(default)]
    pub content: ContentConfig,

    /// Local working paths.
    #[serde(default)]
    pub output: OutputConfig,

    /// Static files copied next to the page.
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            content: ContentConfig::default(),
            output: OutputConfig::default(),
            assets: default_assets(),
        }
    }
}

/// How the remote subtree is materialized locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Shallow sparse `git clone`, then prune to the fetch path.
    #[default]
    Git,
    /// `degit <repo>/<path>#<branch>`.
    Degit,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `owner/name` of the hosted repository.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Branch to fetch and link to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Subtree of the repository that gets fetched (e.g. `site`).
    #[serde(default = "default_fetch_path")]
    pub fetch_path: String,

    /// Tutorial directory inside the fetched subtree.
    #[serde(default = "default_content_path")]
    pub content_path: String,

    /// Hosting API root.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Hosting web root, used for clone URLs and source links.
    #[serde(default = "default_web_base")]
    pub web_base: String,

    /// Name of the env var holding an API token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Sparse fetch implementation.
    #[serde(default)]
    pub fetch_strategy: FetchStrategy,

    /// Override for the fetch executable (`git` or `degit` by default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_program: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            branch: default_branch(),
            fetch_path: default_fetch_path(),
            content_path: default_content_path(),
            api_base: default_api_base(),
            web_base: default_web_base(),
            token_env: default_token_env(),
            fetch_strategy: FetchStrategy::default(),
            fetch_program: None,
        }
    }
}

fn default_repo() -> String {
    "sveltejs/svelte".into()
}
fn default_branch() -> String {
    "master".into()
}
fn default_fetch_path() -> String {
    "site".into()
}
fn default_content_path() -> String {
    "content/tutorial".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_web_base() -> String {
    "https://github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Section metadata sidecar holding `{"title": ...}`.
    #[serde(default = "default_section_meta")]
    pub section_meta: String,

    /// Markdown document inside each chapter directory.
    #[serde(default = "default_chapter_file")]
    pub chapter_file: String,

    /// Worked-solution directory, preferred when present.
    #[serde(default = "default_solution_dir")]
    pub solution_dir: String,

    /// Starter directory, used only when it is the chapter's sole subdirectory.
    #[serde(default = "default_starter_dir")]
    pub starter_dir: String,

    /// File extensions (without the dot) collected as example files.
    #[serde(default = "default_example_extensions")]
    pub example_extensions: Vec<String>,

    /// Canonical page root; the chapter slug is appended.
    #[serde(default = "default_canonical_base")]
    pub canonical_base: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            section_meta: default_section_meta(),
            chapter_file: default_chapter_file(),
            solution_dir: default_solution_dir(),
            starter_dir: default_starter_dir(),
            example_extensions: default_example_extensions(),
            canonical_base: default_canonical_base(),
        }
    }
}

fn default_section_meta() -> String {
    "meta.json".into()
}
fn default_chapter_file() -> String {
    "text.md".into()
}
fn default_solution_dir() -> String {
    "app-b".into()
}
fn default_starter_dir() -> String {
    "app-a".into()
}
fn default_example_extensions() -> Vec<String> {
    vec!["svelte".into()]
}
fn default_canonical_base() -> String {
    "https://svelte.dev/tutorial/".into()
}

/// `[output]` section. Relative paths are resolved against the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Local copy of the fetched subtree.
    #[serde(default = "default_clone_dir")]
    pub clone_dir: String,

    /// Distribution directory receiving `index.html` and assets.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,

    /// HTML template with `{{placeholder}}` slots.
    #[serde(default = "default_template")]
    pub template: String,

    /// Persisted build state.
    #[serde(default = "default_build_info")]
    pub build_info: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clone_dir: default_clone_dir(),
            dist_dir: default_dist_dir(),
            template: default_template(),
            build_info: default_build_info(),
        }
    }
}

fn default_clone_dir() -> String {
    "site-src".into()
}
fn default_dist_dir() -> String {
    "dist".into()
}
fn default_template() -> String {
    "templates/page.html".into()
}
fn default_build_info() -> String {
    "build-info.json".into()
}

/// Which tree an asset path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetBase {
    /// The fetched clone directory.
    Clone,
    /// The project root.
    Project,
}

/// `[[assets]]` entry: copy `from` (file or directory) to `<dist>/<to>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub from: String,
    pub to: String,
    pub base: AssetBase,
}

fn default_assets() -> Vec<AssetEntry> {
    let clone = |from: &str, to: &str| AssetEntry {
        from: from.into(),
        to: to.into(),
        base: AssetBase::Clone,
    };
    vec![
        clone("static/prism.css", "prism.css"),
        clone("static/global.css", "global.css"),
        clone("static/fonts", "fonts"),
        AssetEntry {
            from: "assets/style.css".into(),
            to: "style.css".into(),
            base: AssetBase::Project,
        },
    ]
}

// ---------------------------------------------------------------------------
// Build config (runtime, resolved against the project root)
// ---------------------------------------------------------------------------

/// An asset copy with both ends resolved to absolute-or-rooted paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Runtime build configuration with every path resolved.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root all relative paths were joined onto.
    pub root: PathBuf,
    pub repo: String,
    pub branch: String,
    pub fetch_path: String,
    pub content_path: String,
    pub api_base: String,
    pub web_base: String,
    /// Token read from `source.token_env`, if set and non-empty.
    pub token: Option<String>,
    pub fetch_strategy: FetchStrategy,
    pub fetch_program: Option<String>,
    pub section_meta: String,
    pub chapter_file: String,
    pub solution_dir: String,
    pub starter_dir: String,
    pub example_extensions: Vec<String>,
    pub canonical_base: String,
    pub clone_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub template: PathBuf,
    pub build_info: PathBuf,
    pub assets: Vec<ResolvedAsset>,
}

impl BuildConfig {
    /// Resolve a loaded config against `root`.
    pub fn resolve(config: &AppConfig, root: &Path) -> Self {
        let token = std::env::var(&config.source.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        let clone_dir = root.join(&config.output.clone_dir);
        let dist_dir = root.join(&config.output.dist_dir);

        let assets = config
            .assets
            .iter()
            .map(|a| {
                let base = match a.base {
                    AssetBase::Clone => &clone_dir,
                    AssetBase::Project => root,
                };
                ResolvedAsset {
                    from: base.join(&a.from),
                    to: dist_dir.join(&a.to),
                }
            })
            .collect();

        Self {
            root: root.to_path_buf(),
            repo: config.source.repo.clone(),
            branch: config.source.branch.clone(),
            fetch_path: config.source.fetch_path.clone(),
            content_path: config.source.content_path.clone(),
            api_base: config.source.api_base.clone(),
            web_base: config.source.web_base.clone(),
            token,
            fetch_strategy: config.source.fetch_strategy,
            fetch_program: config.source.fetch_program.clone(),
            section_meta: config.content.section_meta.clone(),
            chapter_file: config.content.chapter_file.clone(),
            solution_dir: config.content.solution_dir.clone(),
            starter_dir: config.content.starter_dir.clone(),
            example_extensions: config.content.example_extensions.clone(),
            canonical_base: config.content.canonical_base.clone(),
            template: root.join(&config.output.template),
            build_info: root.join(&config.output.build_info),
            clone_dir,
            dist_dir,
            assets,
        }
    }

    /// Path of the tutorial inside the remote repository (e.g. `site/content/tutorial`).
    pub fn remote_content_path(&self) -> String {
        join_repo_path(&[&self.fetch_path, &self.content_path])
    }

    /// Local tutorial root inside the fetched clone.
    pub fn content_root(&self) -> PathBuf {
        self.clone_dir.join(&self.content_path)
    }

    /// Rendered page location.
    pub fn output_page(&self) -> PathBuf {
        self.dist_dir.join("index.html")
    }
}

/// Join repository path fragments with `/`, ignoring empty fragments and stray slashes.
pub fn join_repo_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the project config file under `root`.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the config: `explicit` if given, else `<root>/tutpage.toml` if it
/// exists, else defaults.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let path = config_file_path(root);
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TutpageError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TutpageError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `<root>/tutpage.toml`.
/// Refuses to overwrite an existing file. Returns the path written.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(TutpageError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| TutpageError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TutpageError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sveltejs/svelte"));
        assert!(toml_str.contains("GITHUB_TOKEN"));
        assert!(toml_str.contains("[[assets]]"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.source.branch, "master");
        assert_eq!(parsed.content.solution_dir, "app-b");
        assert_eq!(parsed.assets.len(), 4);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[source]
repo = "example/tutorials"
fetch_strategy = "degit"

[content]
example_extensions = ["svelte", "js"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.repo, "example/tutorials");
        assert_eq!(config.source.fetch_strategy, FetchStrategy::Degit);
        assert_eq!(config.source.branch, "master");
        assert_eq!(config.content.example_extensions, vec!["svelte", "js"]);
        assert_eq!(config.output.dist_dir, "dist");
        assert_eq!(config.assets.len(), 4);
    }

    #[test]
    fn explicit_empty_assets() {
        let config: AppConfig = toml::from_str("assets = []").expect("parse");
        assert!(config.assets.is_empty());
    }

    #[test]
    fn build_config_resolves_paths() {
        let mut app = AppConfig::default();
        app.source.token_env = "TUTPAGE_TEST_NONEXISTENT_TOKEN_12345".into();
        let config = BuildConfig::resolve(&app, Path::new("/srv/tut"));

        assert_eq!(config.clone_dir, PathBuf::from("/srv/tut/site-src"));
        assert_eq!(
            config.content_root(),
            PathBuf::from("/srv/tut/site-src/content/tutorial")
        );
        assert_eq!(config.output_page(), PathBuf::from("/srv/tut/dist/index.html"));
        assert_eq!(config.remote_content_path(), "site/content/tutorial");
        assert_eq!(config.token, None);

        assert_eq!(
            config.assets[0],
            ResolvedAsset {
                from: PathBuf::from("/srv/tut/site-src/static/prism.css"),
                to: PathBuf::from("/srv/tut/dist/prism.css"),
            }
        );
        assert_eq!(
            config.assets[3].from,
            PathBuf::from("/srv/tut/assets/style.css")
        );
    }

    #[test]
    fn join_repo_path_skips_empty_segments() {
        assert_eq!(join_repo_path(&["site/", "/content/tutorial"]), "site/content/tutorial");
        assert_eq!(join_repo_path(&["", "content"]), "content");
        assert_eq!(join_repo_path(&[]), "");
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = std::env::temp_dir().join("tutpage-config-test-missing");
        let config = load_config(&dir, None).expect("defaults");
        assert_eq!(config.source.repo, "sveltejs/svelte");
    }
}
