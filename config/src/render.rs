use std::path::{Path, PathBuf};

use crate::{BuildConfig, RenderError};

pub trait Renderer {
    fn render(&self, config: &BuildConfig) -> Result<String, RenderError>;
}

fn check_entry(entry: &str, separator: char) -> Result<(), RenderError> {
    if entry.contains(separator) {
        return Err(RenderError::SeparatorInEntry {
            entry: entry.to_owned(),
            separator,
        });
    }
    Ok(())
}

fn path_str(path: &Path) -> Result<&str, RenderError> {
    path.to_str()
        .ok_or_else(|| RenderError::NonUtf8Path(path.to_path_buf()))
}

pub(crate) fn join_paths(paths: &[PathBuf], separator: char) -> Result<String, RenderError> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let s = path_str(path)?;
        check_entry(s, separator)?;
        parts.push(s);
    }
    Ok(parts.join(&separator.to_string()))
}

pub(crate) fn join_names(names: &[String], separator: char) -> Result<String, RenderError> {
    for name in names {
        check_entry(name, separator)?;
    }
    Ok(names.join(&separator.to_string()))
}

/// The `setup.cfg` style artifact.
#[derive(Debug)]
pub struct IniRenderer {
    separator: char,
}

impl IniRenderer {
    pub fn new(separator: char) -> Self {
        IniRenderer { separator }
    }
}

impl Renderer for IniRenderer {
    fn render(&self, config: &BuildConfig) -> Result<String, RenderError> {
        let mut out = String::new();
        if let Some(prefix) = &config.install_prefix {
            out.push_str(&format!("[install]\nprefix = {}\n\n", path_str(prefix)?));
        }
        out.push_str("[build_ext]\n");
        out.push_str(&format!(
            "library_dirs = {}\n",
            join_paths(&config.library_dirs, self.separator)?
        ));
        out.push_str(&format!(
            "include_dirs = {}\n",
            join_paths(&config.include_dirs, self.separator)?
        ));
        out.push_str(&format!(
            "libraries = {}\n\n",
            join_names(&config.libraries, self.separator)?
        ));
        Ok(out)
    }
}

#[derive(Debug)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, config: &BuildConfig) -> Result<String, RenderError> {
        let mut out = serde_json::to_string_pretty(config)?;
        out.push('\n');
        Ok(out)
    }
}

/// Shell-sourceable `KEY="value"` lines.
#[derive(Debug)]
pub struct EnvRenderer {
    separator: char,
}

impl EnvRenderer {
    pub fn new(separator: char) -> Self {
        EnvRenderer { separator }
    }
}

fn env_line(out: &mut String, key: &str, value: &str) {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`");
    out.push_str(&format!("{}=\"{}\"\n", key, escaped));
}

impl Renderer for EnvRenderer {
    fn render(&self, config: &BuildConfig) -> Result<String, RenderError> {
        let mut out = String::new();
        env_line(
            &mut out,
            "DEPCONF_INCLUDE_DIRS",
            &join_paths(&config.include_dirs, self.separator)?,
        );
        env_line(
            &mut out,
            "DEPCONF_LIBRARY_DIRS",
            &join_paths(&config.library_dirs, self.separator)?,
        );
        env_line(
            &mut out,
            "DEPCONF_LIBRARIES",
            &join_names(&config.libraries, self.separator)?,
        );
        if let Some(prefix) = &config.install_prefix {
            env_line(&mut out, "DEPCONF_INSTALL_PREFIX", path_str(prefix)?);
        }
        Ok(out)
    }
}
