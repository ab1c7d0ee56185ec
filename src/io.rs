use glob::{glob, Pattern};
use jwalk::WalkDir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::classify::Class;
use crate::error::ConvertError;

/// Output folder used by the YOLO label mode
pub const YOLO_DIR: &str = "yolo";

/// Every regular file under `root`, in sorted walk order.
///
/// A missing root yields nothing. A directory that cannot be read below an
/// existing root yields an [`ConvertError::Io`] item.
pub fn walk_files(root: &Path) -> impl Iterator<Item = Result<PathBuf, ConvertError>> {
    let walk_root = root.to_path_buf();
    root.exists()
        .then(|| WalkDir::new(root).sort(true).skip_hidden(false).into_iter())
        .into_iter()
        .flatten()
        .filter_map(move |entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(Ok(e.path())),
            Ok(_) => None,
            Err(e) => Some(Err(ConvertError::Io {
                path: walk_root.clone(),
                source: io::Error::new(io::ErrorKind::Other, e.to_string()),
            })),
        })
}

/// Find all annotation files with the given extension anywhere under `dirname`
pub fn find_annotation_files(dirname: &Path, extension: &str) -> Result<Vec<PathBuf>, ConvertError> {
    // The directory part is matched literally; names like `set[1]` are common.
    let pattern = format!(
        "{}/**/*.{}",
        Pattern::escape(&dirname.to_string_lossy()),
        extension
    );
    let entries = glob(&pattern).map_err(|e| ConvertError::Pattern(e.to_string()))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConvertError::io(&e.path().to_path_buf(), e.into_error()))?;
        if path.is_file() {
            found.push(path);
        }
    }
    Ok(found)
}

/// Extension of `path` with its leading dot, or an empty string
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Locates the image an annotation refers to by base name.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    primary: PathBuf,
    fallback: PathBuf,
}

impl ImageResolver {
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// Search the primary image root, then the fallback root, for a file named
    /// like the last segment of `recorded_path`. Either separator is accepted.
    pub fn resolve(&self, recorded_path: &str) -> Result<Option<PathBuf>, ConvertError> {
        let normalized = recorded_path.replace('\\', "/");
        let Some(base_name) = normalized.rsplit('/').next().filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        match Self::find_in(&self.primary, base_name)? {
            Some(found) => Ok(Some(found)),
            None => Self::find_in(&self.fallback, base_name),
        }
    }

    fn find_in(root: &Path, base_name: &str) -> Result<Option<PathBuf>, ConvertError> {
        for path in walk_files(root) {
            let path = path?;
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name == base_name);
            if matches {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

/// Hands out `<root>/<class>/<class>_<n><ext>` style output paths.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    root: PathBuf,
}

impl OutputNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Created on demand; repeated calls are harmless.
    fn output_dir(&self, segment: &str) -> Result<PathBuf, ConvertError> {
        let dir = self.root.join(segment);
        fs::create_dir_all(&dir).map_err(|e| ConvertError::io(&dir, e))?;
        Ok(dir)
    }

    /// `ext` carries its leading dot (see [`dotted_extension`])
    pub fn name_for(&self, class: Class, counter: usize, ext: &str) -> Result<PathBuf, ConvertError> {
        let dir = self.output_dir(class.as_str())?;
        Ok(dir.join(format!("{}_{}{}", class.as_str(), counter, ext)))
    }

    pub fn yolo_name_for(&self, counter: usize, ext: &str) -> Result<PathBuf, ConvertError> {
        let dir = self.output_dir(YOLO_DIR)?;
        Ok(dir.join(format!("{}{}", counter, ext)))
    }
}
