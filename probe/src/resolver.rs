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
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use depconf_config::{BuildConfig, Renderer};
use depconf_paths::SearchPaths;

use crate::{
    disk_interface::DiskInterface, DependencySpec, Kind, LibraryNaming, Requirements, Resolution,
    ResolveError, Status,
};

/// Observes a pass as it happens. The resolver itself never prints.
pub trait Reporter {
    fn searching(&mut self, kind: Kind, dirs: &[PathBuf]);
    fn checking(&mut self, spec: &DependencySpec);
    fn checked(&mut self, spec: &DependencySpec, status: &Status);
}

pub struct NullReporter;
impl Reporter for NullReporter {
    fn searching(&mut self, _kind: Kind, _dirs: &[PathBuf]) {}
    fn checking(&mut self, _spec: &DependencySpec) {}
    fn checked(&mut self, _spec: &DependencySpec, _status: &Status) {}
}

#[derive(Debug)]
pub struct Resolver<D> {
    disk: D,
    naming: LibraryNaming,
}

impl<D: DiskInterface> Resolver<D> {
    pub fn new(disk: D, naming: LibraryNaming) -> Self {
        Resolver { disk, naming }
    }

    pub fn find_header(&self, name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|candidate| self.disk.exists(candidate))
    }

    pub fn find_library(&self, name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
        let artifacts = self.naming.artifacts(name);
        dirs.iter()
            .flat_map(|dir| artifacts.iter().map(move |a| dir.join(a)))
            .find(|candidate| self.disk.exists(candidate))
    }

    fn check(&self, spec: &DependencySpec, paths: &SearchPaths) -> Status {
        let hit = match spec.kind {
            Kind::Header => self.find_header(&spec.name, &paths.include_dirs),
            Kind::Library => self.find_library(&spec.name, &paths.library_dirs),
        };
        match hit {
            Some(location) => {
                debug!("{} found at {}", spec, location.display());
                Status::Found(location)
            }
            None => Status::Missing,
        }
    }

    /// Checks every requested dependency; a miss never stops the scan.
    pub fn resolve(
        &self,
        requirements: &Requirements,
        paths: &SearchPaths,
        reporter: &mut dyn Reporter,
    ) -> Resolution {
        let specs = requirements.specs();
        let mut entries = Vec::with_capacity(specs.len());
        for kind in &[Kind::Header, Kind::Library] {
            let dirs = match kind {
                Kind::Header => &paths.include_dirs,
                Kind::Library => &paths.library_dirs,
            };
            reporter.searching(*kind, dirs);
            for spec in specs.iter().filter(|s| s.kind == *kind) {
                reporter.checking(spec);
                let status = self.check(spec, paths);
                reporter.checked(spec, &status);
                entries.push((spec.clone(), status));
            }
        }
        Resolution::new(entries)
    }
}

#[derive(Debug)]
pub enum Configured {
    Written {
        resolution: Resolution,
        config: BuildConfig,
        path: PathBuf,
    },
    /// Something was missing; nothing was written.
    Incomplete(Resolution),
}

impl Configured {
    pub fn is_success(&self) -> bool {
        matches!(self, Configured::Written { .. })
    }

    pub fn resolution(&self) -> &Resolution {
        match self {
            Configured::Written { resolution, .. } => resolution,
            Configured::Incomplete(resolution) => resolution,
        }
    }
}

/// Writes into a temp file next to `dest` and renames it over `dest`, so a
/// failure at any point leaves the previous artifact as it was.
fn write_atomically(dest: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    debug!(
        "writing {} bytes to {} via {}",
        contents.len(),
        dest.display(),
        temp.path().display()
    );
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Resolve, and persist the config to `dest` only if everything was found.
/// Per-dependency misses come back as [`Configured::Incomplete`]; an `Err`
/// means the artifact could not be rendered or written.
pub fn configure<D: DiskInterface>(
    resolver: &Resolver<D>,
    requirements: &Requirements,
    paths: &SearchPaths,
    install_prefix: Option<&Path>,
    renderer: &dyn Renderer,
    dest: &Path,
    reporter: &mut dyn Reporter,
) -> Result<Configured, ResolveError> {
    let resolution = resolver.resolve(requirements, paths, reporter);
    if !resolution.is_complete() {
        warn!(
            "{} of {} dependencies missing, not writing {}",
            resolution.missing().len(),
            resolution.entries().len(),
            dest.display()
        );
        return Ok(Configured::Incomplete(resolution));
    }

    let config = resolution.build_config(paths, install_prefix.map(Path::to_path_buf))?;
    // Render fully before touching the destination so a bad path cannot leave
    // a truncated file behind.
    let contents = renderer.render(&config)?;
    write_atomically(dest, contents.as_bytes()).map_err(|source| ResolveError::ConfigWrite {
        path: dest.to_path_buf(),
        source,
    })?;
    info!("wrote {}", dest.display());
    Ok(Configured::Written {
        resolution,
        config,
        path: dest.to_path_buf(),
    })
}
