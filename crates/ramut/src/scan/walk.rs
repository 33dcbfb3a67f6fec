use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::conf::FilesConfig;
use crate::model::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    Bugreport,
    Meminfo,
    Events,
    Stream,
    Log,
}

const LINE_KINDS: &[EventKind] = &[
    EventKind::Kill,
    EventKind::CpuProcess,
    EventKind::CpuTotal,
    EventKind::Launch,
    EventKind::Pss,
    EventKind::ProcessDied,
];

const DUMP_KINDS: &[EventKind] = &[
    EventKind::MeminfoCategory,
    EventKind::RamStatus,
    EventKind::Kill,
    EventKind::CpuProcess,
    EventKind::CpuTotal,
    EventKind::Launch,
    EventKind::Pss,
    EventKind::ProcessDied,
];

impl FileClass {
    /// Event kinds extracted from files of this class.
    pub fn kinds(&self) -> &'static [EventKind] {
        match self {
            FileClass::Bugreport => &EventKind::ALL,
            FileClass::Meminfo => DUMP_KINDS,
            FileClass::Events | FileClass::Stream | FileClass::Log => LINE_KINDS,
        }
    }

    pub fn has_meminfo(&self) -> bool {
        matches!(self, FileClass::Bugreport | FileClass::Meminfo)
    }
}

/// A file selected for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Path relative to the scan root with `/` separators; the file identity
    pub relative: String,
    pub class: FileClass,
}

#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted by relative path
    pub files: Vec<CandidateFile>,
    /// Directory entries that could not be read
    pub errors: Vec<walkdir::Error>,
}

/// File-name marker rules, checked bugreport, meminfo, events, stream, log.
#[derive(Debug, Clone)]
pub struct FileRules {
    rules: Vec<(FileClass, Vec<String>)>,
}

impl FileRules {
    pub fn new(files: &FilesConfig) -> Self {
        Self {
            rules: vec![
                (FileClass::Bugreport, files.bugreport.clone()),
                (FileClass::Meminfo, files.meminfo.clone()),
                (FileClass::Events, files.events.clone()),
                (FileClass::Stream, files.stream.clone()),
                (FileClass::Log, files.log.clone()),
            ],
        }
    }

    /// Class of a file name, or `None` when no marker is a substring of it.
    pub fn classify(&self, file_name: &str) -> Option<FileClass> {
        self.rules.iter().find_map(|(class, markers)| {
            markers
                .iter()
                .any(|m| !m.is_empty() && file_name.contains(m.as_str()))
                .then_some(*class)
        })
    }

    /// Recursively collect candidate files under `root`.
    pub fn discover(&self, root: &Path) -> Discovery {
        let mut discovery = Discovery::default();

        for entry in walkdir::WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    discovery.errors.push(e);
                    continue;
                }
            };
            // Symlinks are kept unless they point at a directory; a dangling
            // one then fails at read time like any other unreadable file.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && !entry.path().is_dir());
            if !is_file {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(class) = self.classify(name) else {
                continue;
            };
            discovery.files.push(CandidateFile {
                relative: relative_key(root, entry.path()),
                path: entry.into_path(),
                class,
            });
        }

        discovery.files.sort_by(|a, b| a.relative.cmp(&b.relative));
        discovery
    }
}

fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
