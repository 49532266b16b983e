//! Reads an ini artifact back into a [`BuildConfig`].
//!
//! This is the consumer half of the hand-off: whatever drives the compiler
//! reads the file, splits each list on the separator and uses the entries
//! verbatim. Only the subset of ini the artifact needs is understood: sections,
//! `key = value` / `key: value` pairs, and `#`/`;` comment lines. Unknown
//! sections and keys are skipped so hand-edited files with extra settings
//! still load.

use std::{collections::HashMap, path::PathBuf};

use thiserror::Error;

use crate::BuildConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected '[section]' or 'key = value', got '{text}'")]
    Malformed { line: usize, text: String },
    #[error("line {line}: '{key}' appears before any section")]
    NoSection { line: usize, key: String },
    #[error("missing [{0}] section")]
    MissingSection(&'static str),
    #[error("missing '{key}' in [{section}]")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },
}

type Sections = HashMap<String, HashMap<String, String>>;

fn parse_sections(text: &str) -> Result<Sections, ParseError> {
    let mut sections: Sections = HashMap::new();
    let mut current: Option<String> = None;
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_owned();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        // Keys never contain a delimiter, so the first one found splits the
        // pair even when the value is a ':' separated list.
        let split = match line.find(&['=', ':'][..]) {
            Some(split) => split,
            None => {
                return Err(ParseError::Malformed {
                    line: i + 1,
                    text: raw.to_owned(),
                })
            }
        };
        let key = line[..split].trim().to_lowercase();
        let value = line[split + 1..].trim().to_owned();
        match &current {
            Some(section) => {
                sections
                    .entry(section.clone())
                    .or_default()
                    .insert(key, value);
            }
            None => return Err(ParseError::NoSection { line: i + 1, key }),
        }
    }
    Ok(sections)
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    if value.is_empty() {
        return vec![];
    }
    value.split(separator).map(str::to_owned).collect()
}

pub fn parse(text: &str, separator: char) -> Result<BuildConfig, ParseError> {
    let sections = parse_sections(text)?;
    let build_ext = sections
        .get("build_ext")
        .ok_or(ParseError::MissingSection("build_ext"))?;
    let get = |key: &'static str| {
        build_ext.get(key).ok_or(ParseError::MissingKey {
            section: "build_ext",
            key,
        })
    };
    let include_dirs = split_list(get("include_dirs")?, separator);
    let library_dirs = split_list(get("library_dirs")?, separator);
    let libraries = split_list(get("libraries")?, separator);
    let install_prefix = sections
        .get("install")
        .and_then(|install| install.get("prefix"))
        .map(PathBuf::from);
    Ok(BuildConfig {
        include_dirs: include_dirs.into_iter().map(PathBuf::from).collect(),
        library_dirs: library_dirs.into_iter().map(PathBuf::from).collect(),
        libraries,
        install_prefix,
    })
}
