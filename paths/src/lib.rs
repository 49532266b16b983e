/*
 * Copyright 2020 Nikhil Marathe <nsm.nikhil@gmail.com>
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Search directory tables.
//!
//! A resolution pass never mutates the default table. [`assemble`] takes the
//! immutable defaults plus the per-run overrides and produces a fresh
//! [`SearchPaths`] every time, so running it twice in one process yields the
//! same lists.

use log::debug;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Separator used when a list of paths is flattened into a single string.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// The standard system directories checked before anything the user passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSearchPaths {
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    /// Whether each default library directory also contributes a `<dir>64`
    /// variant.
    pub multilib: bool,
}

impl DefaultSearchPaths {
    /// No defaults at all. Useful when everything lives under a synthetic root.
    pub fn empty() -> Self {
        DefaultSearchPaths {
            include_dirs: vec![],
            library_dirs: vec![],
            multilib: false,
        }
    }

    /// The system table. `project_dir` contributes `<project_dir>/include` so a
    /// source tree can ship its own headers.
    pub fn system<P: AsRef<Path>>(project_dir: P) -> Self {
        DefaultSearchPaths {
            include_dirs: vec![
                PathBuf::from("/usr/include/dbus-1.0"),
                PathBuf::from("/usr/lib/dbus-1.0/include"),
                PathBuf::from("/usr/local/include/dbus-1.0"),
                project_dir.as_ref().join("include"),
            ],
            library_dirs: vec![PathBuf::from("/usr/lib"), PathBuf::from("/usr/local/lib")],
            multilib: host_is_64bit(),
        }
    }

    pub fn with_multilib(mut self, multilib: bool) -> Self {
        self.multilib = multilib;
        self
    }
}

pub fn host_is_64bit() -> bool {
    cfg!(target_pointer_width = "64")
}

/// Per-run additions on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub prefix: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPaths {
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
}

/// `/usr/lib` -> `/usr/lib64`. Appends to the last component rather than
/// joining, so a trailing separator is dropped first.
pub fn multilib_variant(dir: &Path) -> PathBuf {
    let mut s: OsString = dir.components().collect::<PathBuf>().into_os_string();
    s.push("64");
    PathBuf::from(s)
}

pub fn assemble(defaults: &DefaultSearchPaths, overrides: &Overrides) -> SearchPaths {
    let mut include_dirs = defaults.include_dirs.clone();
    let mut library_dirs = defaults.library_dirs.clone();

    if defaults.multilib {
        library_dirs.extend(defaults.library_dirs.iter().map(|d| multilib_variant(d)));
    }

    include_dirs.extend(overrides.include_dirs.iter().cloned());
    library_dirs.extend(overrides.library_dirs.iter().cloned());

    if let Some(prefix) = &overrides.prefix {
        include_dirs.push(prefix.join("include"));
        library_dirs.push(prefix.join("lib"));
    }

    debug!(
        "assembled {} include dirs, {} library dirs",
        include_dirs.len(),
        library_dirs.len()
    );
    SearchPaths {
        include_dirs,
        library_dirs,
    }
}
