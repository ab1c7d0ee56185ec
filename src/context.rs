//! Run-scoped state shared by every stage of a conversion
//!
//! Counters and the set of already copied images live here instead of in
//! globals, so two runs in one process never see each other's numbering.

use log::debug;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::Class;
use crate::error::ConvertError;
use crate::types::ProcessingStats;

#[derive(Debug, Default)]
pub struct RunContext {
    class_counters: HashMap<Class, usize>,
    global_counter: usize,
    copied_images: HashSet<PathBuf>,
    pub stats: ProcessingStats,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free output number for `class`
    pub fn class_counter(&self, class: Class) -> usize {
        self.class_counters.get(&class).copied().unwrap_or(0)
    }

    pub fn increment_class(&mut self, class: Class) {
        *self.class_counters.entry(class).or_insert(0) += 1;
    }

    /// Next free output number in the YOLO folder
    pub fn global_counter(&self) -> usize {
        self.global_counter
    }

    pub fn increment_global(&mut self) {
        self.global_counter += 1;
    }

    pub fn is_copied(&self, path: &Path) -> bool {
        self.copied_images.contains(path)
    }

    /// Copy an image and remember its source path. Only successful copies
    /// are recorded.
    pub fn copy_image(&mut self, source: &Path, destination: &Path) -> Result<u64, ConvertError> {
        let bytes = fs::copy(source, destination).map_err(|e| ConvertError::io(destination, e))?;
        debug!("Copied {} -> {}", source.display(), destination.display());
        self.copied_images.insert(source.to_path_buf());
        Ok(bytes)
    }
}
