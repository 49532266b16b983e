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

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod ini;
mod render;

pub use depconf_paths::PATH_LIST_SEPARATOR;
pub use render::{EnvRenderer, IniRenderer, JsonRenderer, Renderer};

/// Everything the compiler/linker step needs. Only ever built from a fully
/// resolved pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_prefix: Option<PathBuf>,
}

impl BuildConfig {
    /// `-I` for each include dir, then `-L` for each library dir, then `-l` for
    /// each library, all in list order.
    pub fn compiler_flags(&self) -> Vec<String> {
        let includes = self
            .include_dirs
            .iter()
            .map(|d| format!("-I{}", d.display()));
        let lib_dirs = self
            .library_dirs
            .iter()
            .map(|d| format!("-L{}", d.display()));
        let libs = self.libraries.iter().map(|l| format!("-l{}", l));
        includes.chain(lib_dirs).chain(libs).collect()
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("'{entry}' contains the list separator '{separator}'")]
    SeparatorInEntry { entry: String, separator: char },
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ini,
    Json,
    Env,
}

#[derive(Error, Debug)]
#[error("Unknown output format '{0}' (expected ini, json or env)")]
pub struct FormatError(String);

impl std::str::FromStr for Format {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ini" => Ok(Format::Ini),
            "json" => Ok(Format::Json),
            "env" => Ok(Format::Env),
            e => Err(FormatError(e.to_owned())),
        }
    }
}

impl Format {
    pub fn renderer(self, separator: char) -> Box<dyn Renderer> {
        match self {
            Format::Ini => Box::new(IniRenderer::new(separator)),
            Format::Json => Box::new(JsonRenderer),
            Format::Env => Box::new(EnvRenderer::new(separator)),
        }
    }
}
