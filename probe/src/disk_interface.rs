use log::debug;
use std::{collections::HashSet, path::Path, path::PathBuf};

/// Everything the resolver needs from the filesystem.
pub trait DiskInterface {
    fn exists<P: AsRef<Path>>(&self, p: P) -> bool;
}

pub struct SystemDiskInterface;
impl DiskInterface for SystemDiskInterface {
    fn exists<P: AsRef<Path>>(&self, p: P) -> bool {
        let p = p.as_ref();
        let found = p.exists();
        debug!("probe {} -> {}", p.display(), found);
        found
    }
}

/// A fixed set of paths that "exist". Lets callers resolve against a
/// synthetic tree without touching the disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryDiskInterface {
    files: HashSet<PathBuf>,
}

impl MemoryDiskInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: Into<PathBuf>>(&mut self, p: P) -> &mut Self {
        self.files.insert(p.into());
        self
    }
}

impl<P: Into<PathBuf>> std::iter::FromIterator<P> for MemoryDiskInterface {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        MemoryDiskInterface {
            files: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl DiskInterface for MemoryDiskInterface {
    fn exists<P: AsRef<Path>>(&self, p: P) -> bool {
        self.files.contains(p.as_ref())
    }
}
