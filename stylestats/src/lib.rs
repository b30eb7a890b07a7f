#![doc = include_str!("../README.md")]

pub mod analyzer;
pub mod compile;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gzip;
pub mod metrics;
pub mod options;
pub mod parser;
pub mod source;

pub use analyzer::{Analysis, PropertyCount};
pub use compile::{CommandCompiler, SyntaxCompiler};
pub use error::{CompileError, Error, ErrorKind, Result, SyntaxError, TransportError};
pub use fetch::{HttpClient, HttpResponse, ReqwestClient};
pub use metrics::{MetricRecord, MetricValue, metric_names};
pub use options::{Options, RequestOptions};
pub use source::{Source, SourceSet, Syntax};

use crate::extract::extract;
use crate::fetch::fetch_all;
use crate::metrics::{MetricInput, build_record};
use crate::options::Patterns;

/// All inputs merged into one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Local files, then inline styles, then fetched fragments
    pub text: String,
    /// File paths then URLs, as given
    pub paths: Vec<String>,
    /// Local files plus remote stylesheets
    pub stylesheets: usize,
    pub style_elements: usize,
}

/// Read, compile and fetch every source, then concatenate the results
///
/// Local files and URLs are resolved concurrently. The first failure aborts
/// the run and nothing is returned for the sources that did succeed.
pub async fn resolve<H, C>(sources: &SourceSet, http: &H, compiler: &C) -> Result<Document>
where
    H: HttpClient,
    C: SyntaxCompiler,
{
    if sources.is_empty() {
        return Err(Error::NoInput);
    }

    let (local, remote) = futures::try_join!(
        compile::normalize_files(&sources.files, compiler),
        fetch_all(&sources.urls, http),
    )?;

    tracing::info!(
        files = sources.files.len(),
        styles = sources.styles.len(),
        urls = sources.urls.len(),
        remote_fragments = remote.fragments.len(),
        "Resolved sources"
    );

    let text = local
        .iter()
        .chain(&sources.styles)
        .chain(&remote.fragments)
        .map(String::as_str)
        .collect::<String>();

    Ok(Document {
        text,
        paths: sources.paths(),
        stylesheets: sources.files.len() + remote.stylesheets,
        style_elements: remote.style_elements,
    })
}

/// Compute the metric record for a resolved document
pub fn analyze(document: &Document, options: &Options, published: &str) -> Result<MetricRecord> {
    let patterns = Patterns::compile(options)?;
    let extracted = extract(&document.text)?;
    let analysis = Analysis::new(&extracted, &patterns);

    let input = MetricInput {
        published,
        paths: &document.paths,
        stylesheets: document.stylesheets,
        style_elements: document.style_elements,
        document: &document.text,
        rules: extracted.rules.len(),
        selectors: extracted.selectors.len(),
        media_queries: extracted.media_queries,
        analysis: &analysis,
    };
    Ok(build_record(&input, options))
}

/// Statistics over a set of stylesheet inputs
#[derive(Debug, Clone)]
pub struct StyleStats {
    sources: SourceSet,
    options: Options,
}

impl StyleStats {
    /// Classify `args` (paths, directories, globs, URLs or CSS text)
    pub fn new<I, S>(args: I, options: Options) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_sources(SourceSet::from_args(args), options)
    }

    pub fn from_sources(sources: SourceSet, options: Options) -> Self {
        Self { sources, options }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run the pipeline over HTTP with `reqwest` and the `lessc`/`stylus` executables
    pub async fn parse(&self) -> Result<MetricRecord> {
        let http = ReqwestClient::new(&self.options.request_options).map_err(Error::HttpClient)?;
        self.analyze_with(&http, &CommandCompiler::default()).await
    }

    /// Run the pipeline with the given HTTP client and compiler
    pub async fn analyze_with<H, C>(&self, http: &H, compiler: &C) -> Result<MetricRecord>
    where
        H: HttpClient,
        C: SyntaxCompiler,
    {
        // Bad patterns should fail before any network traffic.
        Patterns::compile(&self.options)?;

        let document = resolve(&self.sources, http, compiler).await?;
        let published = chrono::Local::now().to_rfc3339();
        analyze(&document, &self.options, &published)
    }
}
