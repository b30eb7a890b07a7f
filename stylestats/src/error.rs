//! Error types for the analysis pipeline

use std::path::PathBuf;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every way an analysis run can fail
///
/// All variants are fatal: a run yields either a complete metric record or
/// exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No file, URL, or inline stylesheet was given
    #[error("no stylesheet to analyze: files, URLs and inline styles are all empty")]
    NoInput,

    /// A local stylesheet could not be read
    #[error("failed to read stylesheet '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote stylesheet or page could not be retrieved
    #[error("failed to fetch '{url}'")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// A LESS or Stylus file failed to compile
    #[error("failed to compile '{path}'")]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    /// The merged document was rejected by the grammar parser
    #[error("failed to parse stylesheet")]
    Parse(#[from] SyntaxError),

    /// The merged document parsed but contains no style rule
    #[error("no rule found")]
    NoRules,

    /// The configuration file could not be loaded
    #[error("invalid configuration '{path}'")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// A selector pattern option is not a valid regular expression
    #[error("invalid pattern for option '{option}'")]
    Pattern {
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The request options could not be turned into an HTTP client
    #[error("invalid request options")]
    HttpClient(#[source] TransportError),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Transport,
    Compile,
    Parse,
    Config,
}

impl Error {
    /// The failure class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoInput | Error::Read { .. } => ErrorKind::Input,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Compile { .. } => ErrorKind::Compile,
            Error::Parse(_) | Error::NoRules => ErrorKind::Parse,
            Error::Config { .. } | Error::Pattern { .. } | Error::HttpClient(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn transport(url: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }
}

/// Failure retrieving a single URL
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("status code is {0}")]
    Status(u16),

    #[error("content type is neither HTML nor CSS: {0}")]
    UnsupportedContentType(String),

    #[error("invalid stylesheet link '{href}'")]
    InvalidLink {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header '{0}'")]
    InvalidHeader(String),
}

/// Failure compiling a LESS or Stylus source
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("'{program}' produced non UTF-8 output")]
    Utf8 {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// The grammar parser rejected a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// Failure loading an options file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
