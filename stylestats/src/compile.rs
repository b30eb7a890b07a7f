//! Turning local files into plain CSS
//!
//! CSS files are read as-is. LESS and Stylus files go through a
//! [`SyntaxCompiler`]; the default one runs the `lessc` and `stylus`
//! executables.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::future::try_join_all;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{CompileError, Error, Result};
use crate::source::Syntax;

/// Compiles an alternate stylesheet syntax to CSS
pub trait SyntaxCompiler {
    /// Compile `source`, resolving relative imports against `path`
    fn compile(
        &self,
        source: &str,
        path: &Path,
        syntax: Syntax,
    ) -> impl Future<Output = std::result::Result<String, CompileError>>;
}

/// Runs the LESS and Stylus command line compilers, feeding source on stdin
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    pub lessc: String,
    pub stylus: String,
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self {
            lessc: "lessc".to_string(),
            stylus: "stylus".to_string(),
        }
    }
}

impl CommandCompiler {
    fn command(&self, program: &str, include_dir: &Path, syntax: Syntax) -> Command {
        let mut command = Command::new(program);
        if syntax == Syntax::Less {
            command
                .arg(format!("--include-path={}", include_dir.display()))
                .arg("-");
        } else {
            command.arg("--include").arg(include_dir).arg("--print");
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl SyntaxCompiler for CommandCompiler {
    async fn compile(
        &self,
        source: &str,
        path: &Path,
        syntax: Syntax,
    ) -> std::result::Result<String, CompileError> {
        let program = match syntax {
            Syntax::Css => return Ok(source.to_string()),
            Syntax::Less => self.lessc.clone(),
            Syntax::Stylus => self.stylus.clone(),
        };
        let include_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let spawn_error = |source| CompileError::Spawn {
            program: program.clone(),
            source,
        };

        let mut child = self
            .command(&program, include_dir, syntax)
            .spawn()
            .map_err(spawn_error)?;
        let stdin = child.stdin.take();

        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(source.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let ((), output) =
            futures::try_join!(feed, child.wait_with_output()).map_err(spawn_error)?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|source| CompileError::Utf8 { program, source })
    }
}

/// Read every file and compile the non-CSS ones, concurrently
///
/// The returned fragments follow the order of `files`.
pub async fn normalize_files<C: SyntaxCompiler>(
    files: &[PathBuf],
    compiler: &C,
) -> Result<Vec<String>> {
    try_join_all(files.iter().map(|path| normalize_file(path, compiler))).await
}

async fn normalize_file<C: SyntaxCompiler>(path: &Path, compiler: &C) -> Result<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

    match Syntax::from_path(path) {
        None | Some(Syntax::Css) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "Read stylesheet");
            Ok(text)
        }
        Some(syntax) => {
            let css = compiler
                .compile(&text, path, syntax)
                .await
                .map_err(|source| Error::Compile {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), ?syntax, bytes = css.len(), "Compiled stylesheet");
            Ok(css)
        }
    }
}
