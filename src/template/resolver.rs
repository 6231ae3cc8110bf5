//! Filename resolution for templates referenced from other templates

use std::path::{Component, Path, PathBuf};

/// How a template's source was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Loaded by name through the set's loader
    File,
    /// Compiled from a string handed to the set
    Inline,
}

/// Identity of a template as seen by filename resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateIdentity {
    pub name: String,
    pub kind: SourceKind,
}

impl TemplateIdentity {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::File,
        }
    }

    pub fn inline() -> Self {
        Self {
            name: "<string>".to_string(),
            kind: SourceKind::Inline,
        }
    }
}

/// Resolve `path` as written inside the `requesting` template.
///
/// Absolute paths are kept. Relative paths are taken relative to the
/// directory of the requesting file; templates compiled from strings (and
/// top-level lookups) resolve against `base_dir`. The result is lexically
/// normalized so one file always gets one name.
pub fn resolve_filename(base_dir: &Path, requesting: Option<&TemplateIdentity>, path: &str) -> String {
    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        match requesting {
            Some(identity) if identity.kind == SourceKind::File => Path::new(&identity.name)
                .parent()
                .map(|dir| dir.join(candidate))
                .unwrap_or_else(|| candidate.to_path_buf()),
            _ => base_dir.join(candidate),
        }
    };
    normalize(&joined).to_string_lossy().into_owned()
}

/// Remove `.` components and fold `..` into the preceding component
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}
