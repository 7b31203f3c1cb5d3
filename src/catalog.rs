use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;

pub const DEFAULT_SCRIPTS_DIR: &str = "scripts/light_scripts";

const NAME_MARKER: &str = "# NAME:";

/// A pattern script the device can run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternEntry {
    pub name: String,
    pub file: PathBuf,
}

/// Display name of a pattern script: the text after a line starting with
/// `# NAME:`, or the path itself if there is no such line.
pub fn pattern_name(path: &Path) -> anyhow::Result<String> {
    let file = fs::File::open(path).with_context(|| format!("can't open {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some(name) = line.strip_prefix(NAME_MARKER) {
            return Ok(name.trim().to_string());
        }
    }
    return Ok(path.display().to_string());
}

/// Lists the pattern scripts in `dir`, sorted by path.
pub fn scan(dir: &Path) -> anyhow::Result<Vec<PatternEntry>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("can't list {}", dir.display()))? {
        let path = entry?.path();
        let is_script = path.extension().map_or(false, |ext| ext == "py")
            && path.file_name().map_or(false, |name| name != "__init__.py")
            && path.is_file();
        if is_script {
            files.push(path);
        }
    }
    files.sort();

    let mut entries = Vec::new();
    for file in files {
        let name = pattern_name(&file)?;
        entries.push(PatternEntry { name, file });
    }
    return Ok(entries);
}

/// Resolves user input to a script path: an existing path is taken as is,
/// otherwise it is looked up by name (case-insensitive) or file stem.
pub fn resolve(dir: &Path, pattern: &str) -> anyhow::Result<PathBuf> {
    let as_path = Path::new(pattern);
    if as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }
    let entries = scan(dir)?;
    let found = entries.into_iter().find(|entry| {
        entry.name.eq_ignore_ascii_case(pattern)
            || entry.file.file_stem().map_or(false, |stem| stem == pattern)
    });
    match found {
        Some(entry) => Ok(entry.file),
        None => anyhow::bail!("no pattern named '{}' in {}", pattern, dir.display()),
    }
}
