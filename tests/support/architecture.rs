//! Source scans backing the layering contract.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

fn root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

/// A non-test source line that mentions a forbidden path.
#[derive(Debug)]
pub struct Reference {
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text.trim())
    }
}

fn sources(dir: &Path) -> Vec<PathBuf> {
    let mut pending = vec![dir.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()));
        for path in entries.map(|entry| entry.expect("directory entry").path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Lines under `layer` (relative to the crate root) that mention any of
/// `forbidden`. Each file is read up to its `#[cfg(test)]` module, which
/// sits at the bottom.
pub fn references(layer: &str, forbidden: &[&str]) -> Vec<Reference> {
    let mut found = Vec::new();
    for path in sources(&root().join(layer)) {
        let source = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
        let file = path
            .strip_prefix(root())
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let lines = source
            .lines()
            .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"));
        for (idx, text) in lines.enumerate() {
            if forbidden.iter().any(|pattern| text.contains(pattern)) {
                found.push(Reference {
                    file: file.clone(),
                    line: idx + 1,
                    text: text.to_string(),
                });
            }
        }
    }
    found
}

/// Migration directories, oldest first.
pub fn migrations() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root().join("migrations"))
        .expect("migrations directory")
        .map(|entry| entry.expect("directory entry").path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
