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

use std::{
    collections::HashSet,
    fmt::{self, Display},
    path::PathBuf,
};

use thiserror::Error;

use depconf_config::{BuildConfig, RenderError};
use depconf_paths::SearchPaths;

mod disk_interface;
mod resolver;


pub use disk_interface::{DiskInterface, MemoryDiskInterface, SystemDiskInterface};
pub use resolver::{configure, Configured, NullReporter, Reporter, Resolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Header,
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencySpec {
    pub name: String,
    pub kind: Kind,
}

impl DependencySpec {
    pub fn header<S: Into<String>>(name: S) -> Self {
        DependencySpec {
            name: name.into(),
            kind: Kind::Header,
        }
    }

    pub fn library<S: Into<String>>(name: S) -> Self {
        DependencySpec {
            name: name.into(),
            kind: Kind::Library,
        }
    }
}

impl Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Where the dependency was first seen, in search order.
    Found(PathBuf),
    Missing,
}

impl Status {
    pub fn is_found(&self) -> bool {
        matches!(self, Status::Found(_))
    }
}

/// How a library base-name maps onto the artifacts that satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryNaming {
    pub prefix: String,
    pub static_suffix: String,
    pub shared_suffix: String,
}

#[derive(Error, Debug)]
#[error("Unknown library naming '{0}' (expected unix, macos or windows)")]
pub struct NamingError(String);

impl LibraryNaming {
    pub fn unix() -> Self {
        LibraryNaming {
            prefix: "lib".to_owned(),
            static_suffix: ".a".to_owned(),
            shared_suffix: ".so".to_owned(),
        }
    }

    pub fn macos() -> Self {
        LibraryNaming {
            shared_suffix: ".dylib".to_owned(),
            ..Self::unix()
        }
    }

    pub fn windows() -> Self {
        LibraryNaming {
            prefix: String::new(),
            static_suffix: ".lib".to_owned(),
            shared_suffix: ".dll".to_owned(),
        }
    }

    pub fn host() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else if cfg!(target_os = "macos") {
            Self::macos()
        } else {
            Self::unix()
        }
    }

    /// Static artifact first, then shared.
    pub fn artifacts(&self, name: &str) -> [String; 2] {
        [
            format!("{}{}{}", self.prefix, name, self.static_suffix),
            format!("{}{}{}", self.prefix, name, self.shared_suffix),
        ]
    }
}

impl std::str::FromStr for LibraryNaming {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unix" => Ok(Self::unix()),
            "macos" => Ok(Self::macos()),
            "windows" => Ok(Self::windows()),
            e => Err(NamingError(e.to_owned())),
        }
    }
}

/// The headers and libraries a build needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub headers: Vec<String>,
    pub libraries: Vec<String>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.libraries.is_empty()
    }

    /// Headers then libraries, duplicates dropped after their first mention.
    pub fn specs(&self) -> Vec<DependencySpec> {
        let mut seen = HashSet::new();
        self.headers
            .iter()
            .map(DependencySpec::header)
            .chain(self.libraries.iter().map(DependencySpec::library))
            .filter(|spec| seen.insert(spec.clone()))
            .collect()
    }
}

/// A named requirement set plus the extra include directories its headers
/// are usually spread across.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: &'static str,
    pub requirements: Requirements,
    pub include_dirs: Vec<PathBuf>,
}

#[derive(Error, Debug)]
#[error("Unknown profile '{0}' (expected dbus-python)")]
pub struct ProfileError(String);

impl Profile {
    pub fn dbus_python() -> Self {
        Profile {
            name: "dbus-python",
            requirements: Requirements {
                headers: vec![
                    "dbus-python.h".to_owned(),
                    "glib-object.h".to_owned(),
                    "glibconfig.h".to_owned(),
                ],
                libraries: vec!["dbus-1".to_owned(), "dbus-glib-1".to_owned()],
            },
            include_dirs: vec![
                PathBuf::from("."),
                PathBuf::from("/usr/lib/dbus-1.0/include"),
                PathBuf::from("/usr/include/dbus-1.0/dbus"),
                PathBuf::from("/usr/lib/glib-2.0/include"),
                PathBuf::from("/usr/include/glib-2.0"),
            ],
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dbus-python" => Ok(Self::dbus_python()),
            e => Err(ProfileError(e.to_owned())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("missing header: {0}")]
    MissingHeader(String),
    #[error("missing library: {0}")]
    MissingLibrary(String),
    #[error("unresolved dependencies: {}", join_errors(.0))]
    Unresolved(Vec<ResolveError>),
    #[error("could not write configuration to {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Render(#[from] RenderError),
}

fn join_errors(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-dependency outcome of a pass, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    entries: Vec<(DependencySpec, Status)>,
}

impl Resolution {
    pub(crate) fn new(entries: Vec<(DependencySpec, Status)>) -> Self {
        Resolution { entries }
    }

    pub fn entries(&self) -> &[(DependencySpec, Status)] {
        &self.entries
    }

    pub fn status(&self, spec: &DependencySpec) -> Option<&Status> {
        self.entries
            .iter()
            .find(|(s, _)| s == spec)
            .map(|(_, status)| status)
    }

    fn all_found(&self, kind: Kind) -> bool {
        self.entries
            .iter()
            .filter(|(spec, _)| spec.kind == kind)
            .all(|(_, status)| status.is_found())
    }

    pub fn headers_found(&self) -> bool {
        self.all_found(Kind::Header)
    }

    pub fn libraries_found(&self) -> bool {
        self.all_found(Kind::Library)
    }

    pub fn is_complete(&self) -> bool {
        self.headers_found() && self.libraries_found()
    }

    pub fn missing(&self) -> Vec<ResolveError> {
        self.entries
            .iter()
            .filter(|(_, status)| !status.is_found())
            .map(|(spec, _)| match spec.kind {
                Kind::Header => ResolveError::MissingHeader(spec.name.clone()),
                Kind::Library => ResolveError::MissingLibrary(spec.name.clone()),
            })
            .collect()
    }

    /// Only a complete pass produces a config. The lists are the searched
    /// directories verbatim, not just the ones that had hits.
    pub fn build_config(
        &self,
        paths: &SearchPaths,
        install_prefix: Option<PathBuf>,
    ) -> Result<BuildConfig, ResolveError> {
        if !self.is_complete() {
            return Err(ResolveError::Unresolved(self.missing()));
        }
        Ok(BuildConfig {
            include_dirs: paths.include_dirs.clone(),
            library_dirs: paths.library_dirs.clone(),
            libraries: self
                .entries
                .iter()
                .filter(|(spec, _)| spec.kind == Kind::Library)
                .map(|(spec, _)| spec.name.clone())
                .collect(),
            install_prefix,
        })
    }
}
