//! The conversion engine.
//!
//! A conversion is planned once (validation, mode detection, root and
//! template resolution) and then executed as either a single-file render or
//! a tree pass. Watch mode runs the same plan and then reacts to change
//! batches until the event stream ends or the process is interrupted.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tome_paths::{AnchoredPath, DirRef, Entry, FileRef, RootContext, normalize, to_slash};
use tome_render::{RenderHints, Renderer, escape_html};
use tome_template::{DEFAULT, TemplateCache, TemplateSource, TemplateVars, fill_template};
use tome_watch::{ChangeEvent, ChangeKind, ChangeReceiver, FsWatcher, WatchTarget};

use crate::error::ConvertError;
use crate::ignore::IgnoreSet;
use crate::links::rewrite_links;
use crate::options::ConvertOptions;
use crate::reporter::{Reporter, SilentReporter};

/// Extension of source documents that are rendered instead of copied.
const DOCUMENT_EXT: &str = ".md";

/// Extension given to rendered documents.
const OUTPUT_EXT: &str = "html";

/// Suffix of the default output directory (`docs` -> `docs_html`).
const OUTPUT_DIR_SUFFIX: &str = "_html";

/// Counts of what a conversion did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Documents rendered.
    pub rendered: usize,
    /// Files copied verbatim.
    pub copied: usize,
    /// Files left alone (ignored or not regular files).
    pub skipped: usize,
}

impl ConvertSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Rendered => self.rendered += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Rendered,
    Copied,
    Skipped,
}

/// Destination of a rendered document.
#[derive(Clone, Debug)]
enum Target {
    File(FileRef),
    Stdout,
}

#[derive(Clone, Debug)]
enum Mode {
    Single { source: FileRef, target: Target },
    Tree,
}

/// A validated conversion request with every path resolved.
#[derive(Clone, Debug)]
struct Plan {
    roots: Arc<RootContext>,
    mode: Mode,
    template_id: String,
    /// Set when the template identifier names a file.
    template_file: Option<PathBuf>,
    stylesheet: Option<AnchoredPath>,
    ignore: Arc<IgnoreSet>,
    clean: bool,
}

impl Plan {
    fn watch_targets(&self) -> Vec<WatchTarget> {
        match &self.mode {
            Mode::Single { source, .. } => {
                vec![WatchTarget::File(source.absolute().to_path_buf())]
            }
            Mode::Tree => {
                let mut targets = vec![WatchTarget::Dir(
                    self.roots.input().absolute().to_path_buf(),
                )];
                if let Some(file) = &self.template_file {
                    targets.push(WatchTarget::File(file.clone()));
                }
                targets
            }
        }
    }

    /// Display form of the watched source location.
    fn watched_location(&self) -> String {
        match &self.mode {
            Mode::Single { source, .. } => self.roots.display(source.path()),
            Mode::Tree => self.roots.display(self.roots.input().path()),
        }
    }

    fn template_changed(&self, batch: &[ChangeEvent]) -> bool {
        matches!(self.mode, Mode::Tree)
            && self
                .template_file
                .as_ref()
                .is_some_and(|file| batch.iter().any(|event| event.path == *file))
    }
}

/// Read-only state shared by the tasks of one pass.
struct Job {
    roots: Arc<RootContext>,
    template: Arc<str>,
    stylesheet: Option<AnchoredPath>,
    ignore: Arc<IgnoreSet>,
    renderer: Arc<dyn Renderer>,
    reporter: Arc<dyn Reporter>,
}

/// Converts Markdown files and trees to HTML.
///
/// Each engine owns its template cache and stylesheet cache, and resolves
/// relative paths against its own working directory, so several engines can
/// run side by side in one process.
pub struct Engine {
    cwd: PathBuf,
    renderer: Arc<dyn Renderer>,
    reporter: Arc<dyn Reporter>,
    templates: TemplateCache,
    /// Stylesheet content last written by this engine.
    last_stylesheet: Option<String>,
}

impl Engine {
    /// Create an engine resolving relative paths against `cwd`.
    ///
    /// `cwd` must be absolute.
    pub fn new(cwd: impl Into<PathBuf>, renderer: Arc<dyn Renderer>) -> Self {
        let cwd = normalize(&cwd.into());
        Self {
            templates: TemplateCache::new(&cwd),
            cwd,
            renderer,
            reporter: Arc::new(SilentReporter),
            last_stylesheet: None,
        }
    }

    /// Send user-facing notices to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Convert once.
    ///
    /// A file input is rendered to a single document; a directory input is
    /// mirrored into the output directory, rendering `.md` files and copying
    /// everything else. Nothing is written if validation fails.
    pub async fn convert(
        &mut self,
        options: &ConvertOptions,
    ) -> Result<ConvertSummary, ConvertError> {
        let plan = self.plan(options).await?;
        let job = self.job(&plan);
        self.run(&plan, &job).await
    }

    /// Convert, then keep converting as the sources change.
    ///
    /// Runs until Ctrl-C is received. Failures after the initial pass are
    /// reported as warnings and do not end the session.
    pub async fn watch(
        &mut self,
        options: &ConvertOptions,
        debounce: Duration,
    ) -> Result<(), ConvertError> {
        let plan = self.plan(options).await?;
        let job = self.job(&plan);
        self.run(&plan, &job).await?;

        let (events, _handle) = FsWatcher::start(plan.watch_targets(), debounce)?;
        self.reporter.watching(&plan.watched_location());
        self.event_loop(plan, job, events, ctrl_c()).await;
        Ok(())
    }

    /// Like [`watch`](Self::watch), but reacting to batches from `events`
    /// instead of the filesystem. Returns once every sender is dropped.
    pub async fn watch_events(
        &mut self,
        options: &ConvertOptions,
        events: ChangeReceiver,
    ) -> Result<(), ConvertError> {
        let plan = self.plan(options).await?;
        let job = self.job(&plan);
        self.run(&plan, &job).await?;

        self.reporter.watching(&plan.watched_location());
        self.event_loop(plan, job, events, std::future::pending()).await;
        Ok(())
    }

    /// Validate `options` and resolve everything a conversion needs.
    ///
    /// Touches the filesystem only to inspect it.
    async fn plan(&self, options: &ConvertOptions) -> Result<Plan, ConvertError> {
        let input_text = options.input.trim();
        if input_text.is_empty() {
            return Err(ConvertError::Validation("No input given".to_owned()));
        }

        let template_id = options.template.as_deref().unwrap_or(DEFAULT).trim();
        if template_id.is_empty() {
            return Err(ConvertError::Validation(
                "Template must not be empty".to_owned(),
            ));
        }
        let Some(template) = TemplateSource::resolve(template_id, &self.cwd) else {
            return Err(ConvertError::Validation(format!(
                "Template not found: {template_id}"
            )));
        };

        let ignore = Arc::new(IgnoreSet::new(&options.ignore)?);

        let input = AnchoredPath::resolve(input_text, &self.cwd);
        let input_location = input.location(&self.cwd);
        let Some(entry) = Entry::open(input).await? else {
            return Err(ConvertError::InputNotFound(input_location));
        };

        let to_stdout = options.stdout
            || options
                .output
                .as_deref()
                .is_some_and(|o| o.trim().is_empty());

        let (roots, mode) = match entry {
            Entry::File(source) => {
                let roots = RootContext::single_file(&self.cwd);
                let target = if to_stdout {
                    Target::Stdout
                } else {
                    let text = options
                        .output
                        .clone()
                        .unwrap_or_else(|| format!("{}.{OUTPUT_EXT}", source.stem()));
                    let dest = AnchoredPath::resolve(&text, &self.cwd);
                    if dest.absolute() == source.absolute() {
                        return Err(ConvertError::Validation(format!(
                            "Output {} would overwrite the input file",
                            roots.display(&dest)
                        )));
                    }
                    if DirRef::new(dest.clone()).is_dir().await {
                        return Err(ConvertError::Validation(format!(
                            "Output is a directory: {}",
                            roots.display(&dest)
                        )));
                    }
                    Target::File(FileRef::new(dest))
                };
                (roots, Mode::Single { source, target })
            }
            Entry::Dir(input) => {
                if options.stdout {
                    return Err(ConvertError::Validation(
                        "Cannot write a directory to standard output".to_owned(),
                    ));
                }
                if to_stdout {
                    return Err(ConvertError::Validation(
                        "Output must not be empty when the input is a directory".to_owned(),
                    ));
                }
                let output = match options.output.as_deref() {
                    Some(text) => AnchoredPath::resolve(text, &self.cwd),
                    None => default_output_dir(&input),
                };
                if !output.is_outside(input.absolute()) {
                    return Err(ConvertError::Validation(format!(
                        "Output directory {} must not be inside the input directory {}",
                        output.location(&self.cwd).display(),
                        input.path().location(&self.cwd).display(),
                    )));
                }
                if options.clean && !input.path().is_outside(output.absolute()) {
                    return Err(ConvertError::Validation(format!(
                        "Refusing to clean {}: it contains the input directory",
                        output.location(&self.cwd).display(),
                    )));
                }
                let roots = RootContext::tree(&self.cwd, input, DirRef::new(output));
                (roots, Mode::Tree)
            }
        };

        let stylesheet = options
            .stylesheet
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| roots.resolve_under_output(s));

        tracing::debug!(
            input = %roots.input().path(),
            output = %roots.output().path(),
            template = template_id,
            "Planned conversion"
        );

        Ok(Plan {
            roots: Arc::new(roots),
            mode,
            template_id: template_id.to_owned(),
            template_file: template.file().map(normalize),
            stylesheet,
            ignore,
            clean: options.clean,
        })
    }

    /// Load the plan's template and bundle what the pass tasks share.
    fn job(&mut self, plan: &Plan) -> Arc<Job> {
        let loaded = self.templates.load(&plan.template_id);
        if let Some(warning) = &loaded.warning {
            self.reporter.warning(warning);
        }
        Arc::new(Job {
            roots: Arc::clone(&plan.roots),
            template: loaded.text,
            stylesheet: plan.stylesheet.clone(),
            ignore: Arc::clone(&plan.ignore),
            renderer: Arc::clone(&self.renderer),
            reporter: Arc::clone(&self.reporter),
        })
    }

    /// Execute a full conversion for `plan`.
    async fn run(
        &mut self,
        plan: &Plan,
        job: &Arc<Job>,
    ) -> Result<ConvertSummary, ConvertError> {
        let started = Instant::now();
        if plan.clean && matches!(plan.mode, Mode::Tree) {
            // Cleaning deletes the stylesheet written by earlier passes
            self.last_stylesheet = None;
        }

        let summary = match &plan.mode {
            Mode::Single { source, target } => {
                render_document(job, source, target).await?;
                ConvertSummary {
                    rendered: 1,
                    ..ConvertSummary::default()
                }
            }
            Mode::Tree => tree_pass(plan, job).await?,
        };
        self.refresh_stylesheet(plan).await?;

        tracing::info!(
            rendered = summary.rendered,
            copied = summary.copied,
            skipped = summary.skipped,
            elapsed_ms = started.elapsed().as_millis(),
            "Conversion finished"
        );
        Ok(summary)
    }

    /// Write the renderer's stylesheet if it differs from the last one written.
    async fn refresh_stylesheet(&mut self, plan: &Plan) -> Result<(), ConvertError> {
        let Some(dest) = &plan.stylesheet else {
            return Ok(());
        };
        let Some(css) = self.renderer.stylesheet() else {
            return Ok(());
        };
        if self.last_stylesheet.as_deref() == Some(css.as_str()) {
            tracing::debug!("Stylesheet unchanged");
            return Ok(());
        }

        FileRef::new(dest.clone()).write(&css).await?;
        self.reporter.wrote(&plan.roots.display(dest));
        self.last_stylesheet = Some(css);
        Ok(())
    }

    async fn event_loop(
        &mut self,
        mut plan: Plan,
        mut job: Arc<Job>,
        mut events: ChangeReceiver,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        loop {
            let batch = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Watch stopped");
                    break;
                }
                batch = events.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            if let Err(e) = self.handle_batch(&mut plan, &mut job, batch).await {
                tracing::warn!(error = %e, "Failed to process changes");
                self.reporter.warning(&e.to_string());
            }
        }
    }

    /// React to one batch of changes.
    ///
    /// A template change re-runs the whole tree pass with fresh roots and
    /// template, which also covers every other event in the batch.
    async fn handle_batch(
        &mut self,
        plan: &mut Plan,
        job: &mut Arc<Job>,
        batch: Vec<ChangeEvent>,
    ) -> Result<(), ConvertError> {
        if plan.template_changed(&batch) {
            tracing::info!(template = %plan.template_id, "Template changed");
            self.templates.invalidate(&plan.template_id);
            self.last_stylesheet = None;
            self.renderer.reset();
            plan.roots = Arc::new(RootContext::clone(&plan.roots));
            *job = self.job(plan);
            self.run(plan, job).await?;
            return Ok(());
        }

        let mut tasks: JoinSet<Result<Outcome, ConvertError>> = JoinSet::new();
        for event in batch {
            if event.kind == ChangeKind::Removed {
                tracing::debug!(path = %event.path.display(), "Source removed, output kept");
                continue;
            }

            let path = AnchoredPath::from_absolute(&event.path);
            match &plan.mode {
                Mode::Single { source, target } => {
                    if path.absolute() != source.absolute() {
                        continue;
                    }
                    let (job, source, target) = (Arc::clone(job), source.clone(), target.clone());
                    tasks.spawn(async move {
                        render_document(&job, &source, &target).await?;
                        Ok::<_, ConvertError>(Outcome::Rendered)
                    });
                }
                Mode::Tree => {
                    if path.is_outside(plan.roots.input().absolute()) {
                        tracing::debug!(path = %path, "Change outside the input directory");
                        continue;
                    }
                    let location = plan.roots.display(&path);
                    let files = match changed_files(path).await {
                        Ok(files) => files,
                        Err(e) => {
                            tracing::warn!(path = %location, error = %e, "Failed to inspect changed path");
                            self.reporter.warning(&format!("{location}: {e}"));
                            continue;
                        }
                    };
                    for file in files {
                        let job = Arc::clone(job);
                        tasks.spawn(async move { transform(&job, file).await });
                    }
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result? {
                tracing::warn!(error = %e, "Failed to convert changed file");
                self.reporter.warning(&e.to_string());
            }
        }

        self.refresh_stylesheet(plan).await
    }
}

/// Convert every file below the input root.
///
/// One task per file; the first failure fails the pass and drops the
/// remaining tasks.
async fn tree_pass(plan: &Plan, job: &Arc<Job>) -> Result<ConvertSummary, ConvertError> {
    let output = plan.roots.output();
    if plan.clean {
        tracing::debug!(output = %output.path(), "Cleaning output directory");
        output.clear().await?;
    }
    output.create().await?;

    let mut tasks = JoinSet::new();
    for file in plan.roots.input().files().await? {
        let job = Arc::clone(job);
        tasks.spawn(async move { transform(&job, file).await });
    }

    let mut summary = ConvertSummary::default();
    while let Some(result) = tasks.join_next().await {
        summary.record(result??);
    }
    Ok(summary)
}

/// Source files behind a change notification.
async fn changed_files(path: AnchoredPath) -> std::io::Result<Vec<FileRef>> {
    Ok(match Entry::open(path).await? {
        Some(Entry::File(file)) => vec![file],
        // A directory moved into the tree reports only itself
        Some(Entry::Dir(dir)) => dir.files().await?,
        None => Vec::new(),
    })
}

/// Render or copy one source file of a tree.
async fn transform(job: &Job, source: FileRef) -> Result<Outcome, ConvertError> {
    let rel = job.roots.input_relative(source.path());

    if job.ignore.is_ignored(&rel) {
        tracing::debug!(path = %rel.display(), "Ignored");
        return Ok(Outcome::Skipped);
    }
    if !source.is_file().await {
        tracing::debug!(path = %rel.display(), "Not a regular file");
        return Ok(Outcome::Skipped);
    }

    if source.ext() == DOCUMENT_EXT {
        let dest = job.roots.output().file(&rel.with_extension(OUTPUT_EXT));
        render_document(job, &source, &Target::File(dest)).await?;
        Ok(Outcome::Rendered)
    } else {
        let dest = job.roots.output().file(&rel);
        source.copy_to(&dest).await?;
        job.reporter.wrote(&job.roots.display(dest.path()));
        Ok(Outcome::Copied)
    }
}

/// Render `source` through the renderer, link rewriter and template.
async fn render_document(
    job: &Job,
    source: &FileRef,
    target: &Target,
) -> Result<(), ConvertError> {
    let text = source.read_to_string().await?;
    let modified = source.modified().await?;
    let rendered = job.renderer.render(
        &text,
        &RenderHints {
            source: Some(source.absolute()),
        },
    );

    // Links are computed from the document's directory in input-root
    // coordinates; stylesheet links from where the document really lands.
    let (doc_dir, out_dir) = match target {
        Target::File(dest) => {
            let out_dir = dest.parent();
            let rel_dir = job.roots.output_relative(out_dir.path());
            let doc_dir = job.roots.input().path().join(&rel_dir);
            (doc_dir.absolute().to_path_buf(), out_dir.absolute().to_path_buf())
        }
        Target::Stdout => (
            source.parent().absolute().to_path_buf(),
            job.roots.cwd().to_path_buf(),
        ),
    };

    let content = rewrite_links(&rendered.html, &job.roots, &doc_dir);
    let title = escape_html(&rendered.title.unwrap_or_else(|| source.stem()));
    let date = DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string();
    // Linked only once the renderer has something to write there
    let stylesheet = job
        .stylesheet
        .as_ref()
        .filter(|_| job.renderer.stylesheet().is_some())
        .map(|css| to_slash(&css.path_from(&out_dir)))
        .unwrap_or_default();

    let page = fill_template(
        &job.template,
        &TemplateVars {
            title: &title,
            content: &content,
            date: &date,
            stylesheet: &stylesheet,
        },
    )?;

    match target {
        Target::File(dest) => {
            dest.write(page).await?;
            job.reporter.wrote(&job.roots.display(dest.path()));
        }
        Target::Stdout => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(page.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// `<parent>/<name>_html` for an input directory `<parent>/<name>`.
fn default_output_dir(input: &DirRef) -> AnchoredPath {
    let name = format!("{}{OUTPUT_DIR_SUFFIX}", input.name());
    let parent = input.path().parent().unwrap_or_else(|| input.path().clone());
    parent.join(Path::new(&name))
}

/// Resolves on Ctrl-C. Never resolves if the signal cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
