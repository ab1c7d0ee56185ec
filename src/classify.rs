//! Path-keyword classification
//!
//! A path belongs to the first class whose keyword it contains, compared
//! case-insensitively. Priority is the order of [`CLASS_KEYWORDS`].

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Class {
    Gun,
    Knife,
    Wrench,
    Fork,
    Screwdriver,
    Unknown,
}

/// Keywords in priority order: gun > knife > wrench > fork > screwdriver
pub const CLASS_KEYWORDS: &[(&str, Class)] = &[
    ("gun", Class::Gun),
    ("knife", Class::Knife),
    ("wrench", Class::Wrench),
    ("fork", Class::Fork),
    ("screwdriver", Class::Screwdriver),
];

impl Class {
    pub const ALL: [Class; 6] = [
        Class::Gun,
        Class::Knife,
        Class::Wrench,
        Class::Fork,
        Class::Screwdriver,
        Class::Unknown,
    ];

    /// Output folder and file-name prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Class::Gun => "gun",
            Class::Knife => "knife",
            Class::Wrench => "wrench",
            Class::Fork => "fork",
            Class::Screwdriver => "screwdriver",
            Class::Unknown => "unknown",
        }
    }

    /// YOLO class id. This table is consumed by existing training configs
    /// and does not follow the keyword priority order.
    pub fn label_index(&self) -> Option<u8> {
        match self {
            Class::Knife => Some(0),
            Class::Fork => Some(1),
            Class::Gun => Some(2),
            Class::Wrench => Some(3),
            Class::Screwdriver => Some(4),
            Class::Unknown => None,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a path by the first matching keyword, or `Unknown`
pub fn classify(path: &str) -> Class {
    let path = path.to_lowercase();
    CLASS_KEYWORDS
        .iter()
        .find(|(keyword, _)| path.contains(*keyword))
        .map(|&(_, class)| class)
        .unwrap_or(Class::Unknown)
}

/// YOLO class id for a path, or -1 when no keyword matches
pub fn index_of(path: &str) -> i32 {
    classify(path).label_index().map_or(-1, i32::from)
}

/// Classify by the annotation file's path, then by the image path recorded
/// inside it. Annotation and image trees are often named differently.
pub fn classify_with_fallback(annotation_path: &str, recorded_path: &str) -> Class {
    match classify(annotation_path) {
        Class::Unknown => classify(recorded_path),
        class => class,
    }
}

/// [`index_of`] with the same two-stage fallback as [`classify_with_fallback`]
pub fn index_with_fallback(annotation_path: &str, recorded_path: &str) -> i32 {
    match index_of(annotation_path) {
        -1 => index_of(recorded_path),
        index => index,
    }
}
