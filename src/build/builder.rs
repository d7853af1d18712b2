use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::SiteConfig;

use super::articles::{Article, ArticleIndex, ScanReport};
use super::document::{Document, DocumentNotFound, Slug};
use super::highlight::SyntaxHighlighter;
use super::paths::{output_path, resolve_path, source_path};
use super::pipeline::{Pipeline, PipelineError, RenderedDocument};

/// File name of the published article listing in the output directory.
pub const LISTING_FILE: &str = "articles.json";

/// File name of the highlight theme stylesheet in the output directory.
pub const STYLESHEET_FILE: &str = "highlight.css";

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    NotFound(#[from] DocumentNotFound),

    #[error("not a markup document: {}", .0.display())]
    NotADocument(PathBuf),

    #[error("articles '{}' and '{}' both map to slug '{slug}'", first.display(), second.display())]
    DuplicateSlug {
        slug: Slug,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to serialize article listing: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Components written
    pub documents: usize,
    /// Files in the content directory that are not markup documents
    pub skipped: usize,
    /// Documents that failed (only non-zero with `keep_going`)
    pub failed: usize,
    pub listing: PathBuf,
    pub stylesheet: Option<PathBuf>,
}

pub struct Builder {
    config: SiteConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    pipeline: Arc<Pipeline>,
}

impl Builder {
    pub fn new(config: SiteConfig, base_path: PathBuf) -> Self {
        let pipeline = Arc::new(Pipeline::from_config(&config));
        Self {
            config,
            base_path,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The content directory, resolved against base_path.
    pub fn content_dir(&self) -> PathBuf {
        resolve_path(&self.base_path, &self.config.content)
    }

    /// The output directory, resolved against base_path.
    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.base_path, &self.config.output)
    }

    /// List the regular files in the content directory, sorted by path.
    ///
    /// Hidden files and subdirectories are skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>, BuildError> {
        let dir = self.content_dir();
        let entries = std::fs::read_dir(&dir).map_err(|e| BuildError::io(&dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::io(&dir, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths)
    }

    /// Read every discovered document's metadata into an article index.
    ///
    /// Only an unreadable content directory is an error; a source that cannot
    /// be read is reported alongside the index like any other failure.
    pub fn index(&self) -> Result<ScanReport, BuildError> {
        let formats = self.pipeline.formats();
        let mut docs = Vec::new();
        let mut unreadable = Vec::new();

        for path in self.discover()?.into_iter().filter(|p| formats.is_document(p)) {
            match Document::read(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable article");
                    let name = Document::new(&path, "").display_name();
                    unreadable.push(PipelineError::new("read", name, e));
                }
            }
        }

        let mut report = ArticleIndex::from_documents(docs, formats);
        report.failures.splice(0..0, unreadable);
        tracing::debug!(
            articles = report.index.len(),
            failures = report.failures.len(),
            "indexed articles"
        );
        Ok(report)
    }

    /// Find the source file for a slug, trying every registered extension.
    pub fn source_for_slug(&self, slug: &str) -> Result<PathBuf, BuildError> {
        let parsed = Slug::parse(slug).map_err(|_| DocumentNotFound::new(slug))?;
        let content_dir = self.content_dir();

        self.pipeline
            .formats()
            .all_extensions()
            .into_iter()
            .map(|ext| source_path(&content_dir, &parsed, ext))
            .find(|path| path.is_file())
            .ok_or_else(|| DocumentNotFound::new(slug).into())
    }

    /// Render the document stored under a slug.
    pub fn render_slug(&self, slug: &str) -> Result<RenderedDocument, BuildError> {
        let path = self.source_for_slug(slug)?;
        self.render_path(&path)
    }

    /// Render a single source file.
    pub fn render_path(&self, path: &Path) -> Result<RenderedDocument, BuildError> {
        render_file(&self.pipeline, path)?.ok_or_else(|| BuildError::NotADocument(path.to_path_buf()))
    }

    /// Render every document in the content directory.
    ///
    /// Documents are rendered concurrently on the blocking pool. Without
    /// `keep_going` the first failure aborts the build; with it, failures are
    /// logged and counted and everything else is still written.
    pub async fn build(&self, keep_going: bool) -> Result<BuildResult, BuildError> {
        // Build pipeline:
        // 1. Discover source files
        // 2. Render each document and write its component
        // 3. Write the article listing
        // 4. Write the highlight stylesheet

        // Step 1: Discover
        let paths = self.discover()?;
        check_unique_slugs(&paths, &self.pipeline)?;
        tracing::info!(
            files = paths.len(),
            dir = %self.content_dir().display(),
            "discovered source files"
        );

        let output_dir = self.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| BuildError::io(&output_dir, e))?;

        // Step 2: Render concurrently, write as results come in
        let mut tasks = JoinSet::new();
        for path in paths {
            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn_blocking(move || render_file(&pipeline, &path));
        }

        let mut articles = Vec::new();
        let mut skipped = 0;
        let mut failed = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined? {
                Ok(Some(rendered)) => {
                    let path = output_path(&output_dir, &rendered.slug, &self.config.output_extension);
                    tokio::fs::write(&path, &rendered.code)
                        .await
                        .map_err(|e| BuildError::io(&path, e))?;
                    tracing::debug!(document = %rendered.slug, path = %path.display(), "wrote component");
                    articles.push(Article::from_front_matter(rendered.slug, &rendered.front_matter));
                }
                Ok(None) => skipped += 1,
                Err(e) if keep_going => {
                    tracing::error!(error = %e, "document failed");
                    failed += 1;
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        // Step 3: Listing
        let documents = articles.len();
        let index = ArticleIndex::new(articles);
        let listing = output_dir.join(LISTING_FILE);
        let json = serde_json::to_string_pretty(&index.articles())?;
        tokio::fs::write(&listing, json)
            .await
            .map_err(|e| BuildError::io(&listing, e))?;

        // Step 4: Stylesheet
        let stylesheet = if self.config.highlight.enabled {
            self.write_stylesheet(&output_dir).await?
        } else {
            None
        };

        tracing::info!(documents, skipped, failed, output = %output_dir.display(), "build finished");

        Ok(BuildResult {
            output_dir,
            documents,
            skipped,
            failed,
            listing,
            stylesheet,
        })
    }

    async fn write_stylesheet(&self, output_dir: &Path) -> Result<Option<PathBuf>, BuildError> {
        let theme = &self.config.highlight.theme;
        let Some(css) = SyntaxHighlighter::new(theme).generate_css() else {
            tracing::warn!(theme = %theme, "unknown highlight theme, no stylesheet written");
            return Ok(None);
        };

        let path = output_dir.join(STYLESHEET_FILE);
        tokio::fs::write(&path, css)
            .await
            .map_err(|e| BuildError::io(&path, e))?;
        Ok(Some(path))
    }
}

/// Read and render one file. `Ok(None)` for files that are not markup documents.
fn render_file(pipeline: &Pipeline, path: &Path) -> Result<Option<RenderedDocument>, BuildError> {
    if !pipeline.formats().is_document(path) {
        return Ok(None);
    }
    let doc = Document::read(path).map_err(|e| BuildError::io(path, e))?;
    Ok(pipeline.run(doc)?)
}

/// Two sources with the same stem (e.g. `a.md` and `a.markdown`) would
/// overwrite each other's output.
fn check_unique_slugs(paths: &[PathBuf], pipeline: &Pipeline) -> Result<(), BuildError> {
    let mut seen: HashMap<Slug, &PathBuf> = HashMap::new();

    for path in paths.iter().filter(|p| pipeline.formats().is_document(p)) {
        // Invalid slugs are reported by the pipeline run
        let Ok(slug) = Slug::from_path(path) else {
            continue;
        };
        if let Some(first) = seen.get(&slug) {
            return Err(BuildError::DuplicateSlug {
                slug,
                first: first.to_path_buf(),
                second: path.clone(),
            });
        }
        seen.insert(slug, path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::StageError;

    fn article(title: &str, date: &str, published: bool) -> String {
        format!(
            "---\ntitle: {title}\ndate: {date}\ncategories: [rust]\npublished: {published}\n---\n\n# {title}\n\nBind `{{x}}` once.\n\n```rust\nfn main() {{}}\n```\n"
        )
    }

    /// A project directory with `articles/` as content and `out/` as output.
    fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, SiteConfig) {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("articles");
        std::fs::create_dir_all(&content).unwrap();
        for (name, source) in files {
            std::fs::write(content.join(name), source).unwrap();
        }

        let config = SiteConfig {
            content: PathBuf::from("articles"),
            output: PathBuf::from("out"),
            ..SiteConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_discover_sorted_files_only() {
        let (dir, config) = project(&[
            ("b.md", "x"),
            ("a.md", "x"),
            (".hidden.md", "x"),
            ("notes.txt", "x"),
        ]);
        std::fs::create_dir_all(dir.path().join("articles/nested")).unwrap();

        let builder = Builder::new(config, dir.path().to_path_buf());
        let names: Vec<String> = builder
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "notes.txt"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Builder::new(SiteConfig::default(), dir.path().to_path_buf());
        assert!(matches!(builder.discover(), Err(BuildError::Io { .. })));
    }

    #[test]
    fn test_source_for_slug_and_render() {
        let (dir, config) = project(&[("hello.markdown", &article("Hello", "2024-01-01", true))]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let path = builder.source_for_slug("hello").unwrap();
        assert!(path.ends_with("articles/hello.markdown"));

        let rendered = builder.render_slug("hello").unwrap();
        assert_eq!(rendered.front_matter.title, "Hello");
        assert!(rendered.code.starts_with("<script context=\"module\">"));
    }

    #[test]
    fn test_unknown_slug() {
        let (dir, config) = project(&[]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        assert!(matches!(
            builder.render_slug("missing"),
            Err(BuildError::NotFound(DocumentNotFound { slug })) if slug == "missing"
        ));
        assert!(matches!(
            builder.source_for_slug("../secret"),
            Err(BuildError::NotFound(_))
        ));
    }

    #[test]
    fn test_render_path_rejects_non_documents() {
        let (dir, config) = project(&[("notes.txt", "x")]);
        let builder = Builder::new(config, dir.path().to_path_buf());
        let path = dir.path().join("articles/notes.txt");
        assert!(matches!(builder.render_path(&path), Err(BuildError::NotADocument(_))));
    }

    #[test]
    fn test_index() {
        let (dir, config) = project(&[
            ("one.md", &article("One", "2024-01-01", true)),
            ("two.md", &article("Two", "2024-06-01", true)),
            ("draft.md", &article("Draft", "2024-09-01", false)),
            ("notes.txt", "x"),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let report = builder.index().unwrap();
        assert!(report.failures.is_empty());
        let slugs: Vec<&str> = report.index.articles().iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["two", "one"]);
        assert!(report.index.get("draft").is_ok());
    }

    #[test]
    fn test_index_reports_unreadable_sources() {
        let (dir, config) = project(&[("good.md", &article("Good", "2024-01-01", true))]);
        std::fs::write(dir.path().join("articles/bad.md"), [b'-', b'-', b'-', b'\n', 0xff, b'\n']).unwrap();
        let builder = Builder::new(config, dir.path().to_path_buf());

        let report = builder.index().unwrap();
        assert_eq!(report.index.len(), 1);
        assert!(report.index.get("good").is_ok());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, "read");
        assert_eq!(report.failures[0].document, "bad.md");
        assert!(matches!(report.failures[0].source, StageError::Unreadable(_)));
    }

    #[test]
    fn test_index_reports_duplicate_slugs() {
        let (dir, config) = project(&[
            ("same.markdown", &article("A", "2024-01-01", true)),
            ("same.md", &article("B", "2024-01-01", true)),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let report = builder.index().unwrap();
        assert_eq!(report.index.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].source, StageError::DuplicateSlug { .. }));
    }

    #[tokio::test]
    async fn test_build_writes_outputs() {
        let (dir, config) = project(&[
            ("hello.md", &article("Hello", "2024-01-01", true)),
            ("draft.md", &article("Draft", "2024-02-01", false)),
            ("logo.svg", "<svg/>"),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let result = builder.build(false).await.unwrap();
        assert_eq!(result.documents, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 0);

        let out = dir.path().join("out");
        let hello = std::fs::read_to_string(out.join("hello.svelte")).unwrap();
        assert!(hello.contains("export const metadata = {\"title\":\"Hello\""));
        assert!(hello.contains("<code>&#123;x&#125;</code>"));
        let body = &hello[hello.find("</script>\n").unwrap()..];
        assert!(!body.contains('{'));
        assert!(!body.contains('}'));
        assert!(out.join("draft.svelte").exists());
        assert!(!out.join("logo.svelte").exists());

        let listing: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.listing).unwrap()).unwrap();
        let listed: Vec<&str> = listing
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["slug"].as_str().unwrap())
            .collect();
        assert_eq!(listed, vec!["hello"]);

        let css = result.stylesheet.unwrap();
        assert_eq!(css, out.join(STYLESHEET_FILE));
        assert!(!std::fs::read_to_string(css).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_aborts_on_first_failure() {
        let (dir, config) = project(&[
            ("good.md", &article("Good", "2024-01-01", true)),
            ("broken.md", "---\ntitle: Broken\n---\n"),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let err = match builder.build(false).await {
            Err(BuildError::Pipeline(err)) => err,
            other => panic!("expected pipeline error, got {other:?}"),
        };
        assert_eq!(err.stage, "frontmatter");
        assert_eq!(err.document, "broken");
        assert!(matches!(err.source, StageError::MalformedFrontmatter(_)));
        assert!(!dir.path().join("out/broken.svelte").exists());
    }

    #[tokio::test]
    async fn test_build_keep_going() {
        let (dir, config) = project(&[
            ("good.md", &article("Good", "2024-01-01", true)),
            ("broken.md", "---\ntitle: Broken\n---\n"),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        let result = builder.build(true).await.unwrap();
        assert_eq!(result.documents, 1);
        assert_eq!(result.failed, 1);
        assert!(dir.path().join("out/good.svelte").exists());
        assert!(!dir.path().join("out/broken.svelte").exists());
    }

    #[tokio::test]
    async fn test_build_without_highlighting() {
        let (dir, mut config) = project(&[("hello.md", &article("Hello", "2024-01-01", true))]);
        config.highlight.enabled = false;
        config.output_extension = "html".to_string();
        let builder = Builder::new(config, dir.path().to_path_buf());

        let result = builder.build(false).await.unwrap();
        assert!(result.stylesheet.is_none());
        assert!(!dir.path().join("out").join(STYLESHEET_FILE).exists());

        let hello = std::fs::read_to_string(dir.path().join("out/hello.html")).unwrap();
        assert!(hello.contains("data-lang=\"rust\">fn main() &#123;&#125;\n</code>"));
    }

    #[tokio::test]
    async fn test_build_rejects_duplicate_slugs() {
        let (dir, config) = project(&[
            ("same.md", &article("A", "2024-01-01", true)),
            ("same.markdown", &article("B", "2024-01-01", true)),
        ]);
        let builder = Builder::new(config, dir.path().to_path_buf());

        assert!(matches!(
            builder.build(true).await,
            Err(BuildError::DuplicateSlug { .. })
        ));
    }
}
