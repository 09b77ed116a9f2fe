use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: PathBuf, contents: String) -> Self {
        Self { path, contents }
    }

    /// Source held in memory only, reported as `<input>`.
    pub fn from_string<S: Into<String>>(contents: S) -> Self {
        Self::new(PathBuf::from("<input>"), contents.into())
    }

    /// One-based line lookup used when rendering diagnostics.
    pub fn line(&self, number: usize) -> Option<&str> {
        self.contents.lines().nth(number.checked_sub(1)?)
    }
}
