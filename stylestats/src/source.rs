//! Classification of raw inputs into files, URLs and inline stylesheets

use std::path::{Path, PathBuf};

use url::Url;

use crate::parser::looks_like_css;

/// Extensions accepted as local stylesheets
pub const EXTENSIONS: &[&str] = &["css", "less", "styl", "stylus"];

/// The language a local stylesheet is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Css,
    Less,
    Stylus,
}

impl Syntax {
    /// Detect the syntax from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "css" => Some(Syntax::Css),
            "less" => Some(Syntax::Less),
            "styl" | "stylus" => Some(Syntax::Stylus),
            _ => None,
        }
    }
}

/// One classified input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(Url),
    InlineText(String),
}

/// Classify a single argument. Directories and globs expand to several files
pub fn classify(arg: &str) -> Vec<Source> {
    let path = Path::new(arg);

    if path.is_file() && Syntax::from_path(path).is_some() {
        return vec![Source::File(path.to_path_buf())];
    }

    if path.is_dir() {
        return stylesheets_in_dir(path)
            .into_iter()
            .map(Source::File)
            .collect();
    }

    if let Ok(url) = Url::parse(arg)
        && matches!(url.scheme(), "http" | "https")
    {
        return vec![Source::Url(url)];
    }

    if looks_like_css(arg) {
        return vec![Source::InlineText(arg.to_string())];
    }

    let matches = glob_css_files(arg);
    if matches.is_empty() {
        tracing::warn!(arg, "Input is not a stylesheet, URL, or CSS text; skipping");
    }
    matches.into_iter().map(Source::File).collect()
}

fn stylesheets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), %err, "Failed to read directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && Syntax::from_path(path).is_some())
        .collect();
    files.sort();
    files
}

fn glob_css_files(pattern: &str) -> Vec<PathBuf> {
    let Ok(paths) = glob::glob(pattern) else {
        return Vec::new();
    };
    paths
        .filter_map(Result::ok)
        .filter(|path| Syntax::from_path(path) == Some(Syntax::Css))
        .collect()
}

/// Inputs grouped by kind, each group in argument order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub files: Vec<PathBuf>,
    pub urls: Vec<Url>,
    pub styles: Vec<String>,
}

impl SourceSet {
    /// Classify every argument
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .flat_map(|arg| classify(arg.as_ref()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.urls.is_empty() && self.styles.is_empty()
    }

    /// File paths followed by URLs, as given
    pub fn paths(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|path| path.display().to_string())
            .chain(self.urls.iter().map(Url::to_string))
            .collect()
    }
}

impl FromIterator<Source> for SourceSet {
    fn from_iter<T: IntoIterator<Item = Source>>(iter: T) -> Self {
        let mut set = SourceSet::default();
        for source in iter {
            match source {
                Source::File(path) => set.files.push(path),
                Source::Url(url) => set.urls.push(url),
                Source::InlineText(text) => set.styles.push(text),
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_from_path() {
        assert_eq!(Syntax::from_path(Path::new("a.css")), Some(Syntax::Css));
        assert_eq!(Syntax::from_path(Path::new("a.less")), Some(Syntax::Less));
        assert_eq!(Syntax::from_path(Path::new("a.styl")), Some(Syntax::Stylus));
        assert_eq!(Syntax::from_path(Path::new("a.stylus")), Some(Syntax::Stylus));
        assert_eq!(Syntax::from_path(Path::new("a.scss")), None);
        assert_eq!(Syntax::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_classify_urls_and_inline_text() {
        assert_eq!(
            classify("https://example.com/style.css"),
            vec![Source::Url(Url::parse("https://example.com/style.css").unwrap())]
        );
        assert_eq!(
            classify("a { color: red }"),
            vec![Source::InlineText("a { color: red }".to_string())]
        );
        assert!(classify("ftp://example.com/style.css").is_empty());
    }

    #[test]
    fn test_classify_files_directories_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.css", "a.less", "c.styl", "notes.txt"] {
            std::fs::write(dir.path().join(name), "a { top: 0 }").unwrap();
        }

        let file = dir.path().join("b.css");
        assert_eq!(
            classify(file.to_str().unwrap()),
            vec![Source::File(file.clone())]
        );

        let from_dir = classify(dir.path().to_str().unwrap());
        assert_eq!(
            from_dir,
            vec![
                Source::File(dir.path().join("a.less")),
                Source::File(dir.path().join("b.css")),
                Source::File(dir.path().join("c.styl")),
            ]
        );

        let pattern = dir.path().join("*");
        assert_eq!(
            classify(pattern.to_str().unwrap()),
            vec![Source::File(file)]
        );
    }

    #[test]
    fn test_source_set_groups_in_order() {
        let set = SourceSet::from_args([
            "http://a.test/",
            "a { top: 0 }",
            "http://b.test/x.css",
        ]);
        assert_eq!(set.urls.len(), 2);
        assert_eq!(set.styles, vec!["a { top: 0 }"]);
        assert_eq!(set.paths(), vec!["http://a.test/", "http://b.test/x.css"]);
        assert!(!set.is_empty());
        assert!(SourceSet::default().is_empty());
    }
}
