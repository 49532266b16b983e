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

use anyhow::{self, Context};
use console::style;
use log::{debug, info};
use thiserror::Error;

use depconf_config::{ini, Format, PATH_LIST_SEPARATOR};
use depconf_paths::{assemble, DefaultSearchPaths, Overrides, SearchPaths};
use depconf_probe::{
    configure, Configured, DependencySpec, Kind, LibraryNaming, Profile, Reporter, Requirements,
    Resolver, Status, SystemDiskInterface,
};

pub const USAGE: &str = "\
Usage: depconf [configure] [options]
       depconf flags [-c <file>]

Options:
  -c, --config_file <file>  output configuration file (defaults to setup.cfg)
  -i, --include_dir <path>  extra header search directory (repeatable)
  -l, --library_dir <path>  extra library search directory (repeatable)
  -p, --prefix <path>       install prefix
      --header <name>       required header (repeatable)
      --library <name>      required library base-name (repeatable)
      --profile <name>      built-in requirement set (dbus-python)
      --format <fmt>        ini, json or env (defaults to ini)
      --naming <scheme>     unix, macos or windows library naming
      --no-multilib         do not add <dir>64 library directories
  -v, --verbose             debug logging
  -h, --help                print this message";

#[derive(Error, Debug)]
pub enum ArgError {
    #[error("{0}")]
    Parse(#[from] pico_args::Error),
    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

#[derive(Debug)]
pub struct Config {
    pub config_file: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub prefix: Option<PathBuf>,
    pub headers: Vec<String>,
    pub libraries: Vec<String>,
    pub profile: Option<Profile>,
    pub format: Format,
    pub naming: LibraryNaming,
    pub multilib: bool,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    Configure(Config),
    Flags { config_file: PathBuf, verbose: bool },
    Help,
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Configure(config) => config.verbose,
            Command::Flags { verbose, .. } => *verbose,
            Command::Help => false,
        }
    }
}

fn config_file(args: &mut pico_args::Arguments) -> Result<PathBuf, ArgError> {
    Ok(args
        .opt_value_from_str(["-c", "--config_file"])?
        .unwrap_or_else(|| PathBuf::from("setup.cfg")))
}

fn no_free_args(args: pico_args::Arguments) -> Result<(), ArgError> {
    match args.free()?.into_iter().next() {
        Some(extra) => Err(ArgError::Unexpected(extra)),
        None => Ok(()),
    }
}

pub fn parse_args(mut args: pico_args::Arguments) -> Result<Command, ArgError> {
    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }
    let verbose = args.contains(["-v", "--verbose"]);
    match args.subcommand()?.as_deref() {
        None | Some("configure") => {}
        Some("flags") => {
            let config_file = config_file(&mut args)?;
            no_free_args(args)?;
            return Ok(Command::Flags {
                config_file,
                verbose,
            });
        }
        Some(other) => return Err(ArgError::UnknownSubcommand(other.to_owned())),
    }

    let config = Config {
        config_file: config_file(&mut args)?,
        include_dirs: args.values_from_str(["-i", "--include_dir"])?,
        library_dirs: args.values_from_str(["-l", "--library_dir"])?,
        prefix: args.opt_value_from_str(["-p", "--prefix"])?,
        headers: args.values_from_str("--header")?,
        libraries: args.values_from_str("--library")?,
        profile: args.opt_value_from_str("--profile")?,
        format: args.opt_value_from_str("--format")?.unwrap_or(Format::Ini),
        naming: args
            .opt_value_from_str("--naming")?
            .unwrap_or_else(LibraryNaming::host),
        multilib: !args.contains("--no-multilib"),
        verbose,
    };
    no_free_args(args)?;
    Ok(Command::Configure(config))
}

impl Config {
    /// Explicit `--header`/`--library` entries are added on top of the
    /// profile. With neither a profile nor explicit entries, the dbus-python
    /// profile applies.
    pub fn requirements(&self) -> (Requirements, Vec<PathBuf>) {
        let explicit = Requirements {
            headers: self.headers.clone(),
            libraries: self.libraries.clone(),
        };
        let profile = match &self.profile {
            Some(profile) => Some(profile.clone()),
            None if explicit.is_empty() => Some(Profile::dbus_python()),
            None => None,
        };
        match profile {
            Some(mut profile) => {
                profile.requirements.headers.extend(explicit.headers);
                profile.requirements.libraries.extend(explicit.libraries);
                (profile.requirements, profile.include_dirs)
            }
            None => (explicit, vec![]),
        }
    }

    pub fn search_paths(&self, defaults: &DefaultSearchPaths) -> SearchPaths {
        let (_, profile_dirs) = self.requirements();
        let overrides = Overrides {
            include_dirs: profile_dirs
                .into_iter()
                .chain(self.include_dirs.iter().cloned())
                .collect(),
            library_dirs: self.library_dirs.clone(),
            prefix: self.prefix.clone(),
        };
        assemble(&defaults.clone().with_multilib(defaults.multilib && self.multilib), &overrides)
    }
}

/// Prints the `Checking for ... ok` lines. Write errors are kept and
/// surfaced by [`ConsoleReporter::finish`].
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        ConsoleReporter { out, error: None }
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(e) = self.out.write_fmt(args) {
                self.error = Some(e);
            }
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn searching(&mut self, kind: Kind, dirs: &[PathBuf]) {
        match kind {
            Kind::Header => {
                self.emit(format_args!("Looking for header files in the following include paths:\n"))
            }
            Kind::Library => {
                self.emit(format_args!("Looking for libraries in the following library paths:\n"))
            }
        }
        for dir in dirs {
            self.emit(format_args!("\t {}\n", dir.display()));
        }
    }

    fn checking(&mut self, spec: &DependencySpec) {
        self.emit(format_args!("Checking for {} ... ", spec));
    }

    fn checked(&mut self, _spec: &DependencySpec, status: &Status) {
        match status {
            Status::Found(_) => self.emit(format_args!("{}\n", style("ok").green())),
            Status::Missing => self.emit(format_args!("{}\n", style("FAIL").red().bold())),
        }
    }
}

/// Printed to stderr when configuration fails. Lists every missing item and
/// the directories that were searched for it.
pub fn remediation(outcome: &Configured, paths: &SearchPaths) -> String {
    let mut text = String::from(
        "*** ERROR not all files, required for compilation, have been found.\n\
         *** ERROR Please make sure you have installed all the requirements.\n\
         *** ERROR Also check that the search paths passed to depconf are correct.\n",
    );
    for (spec, status) in outcome.resolution().entries() {
        if status.is_found() {
            continue;
        }
        let (what, dirs) = match spec.kind {
            Kind::Header => ("header", &paths.include_dirs),
            Kind::Library => ("library", &paths.library_dirs),
        };
        let searched: Vec<_> = dirs.iter().map(|d| d.display().to_string()).collect();
        text.push_str(&format!(
            "*** ERROR missing {} '{}', searched: {}\n",
            what,
            spec,
            searched.join(", ")
        ));
    }
    text
}

/// One configure pass against `defaults`, writing progress to `out`.
pub fn run_configure<W: Write>(
    config: &Config,
    defaults: &DefaultSearchPaths,
    out: W,
) -> anyhow::Result<(Configured, SearchPaths, W)> {
    let mut reporter = ConsoleReporter::new(out);
    if let Some(prefix) = &config.prefix {
        reporter.emit(format_args!(
            "Using the following install prefix: {}\n",
            prefix.display()
        ));
    }

    let (requirements, _) = config.requirements();
    let paths = config.search_paths(defaults);
    debug!(
        "{} headers, {} libraries; {} include dirs, {} library dirs",
        requirements.headers.len(),
        requirements.libraries.len(),
        paths.include_dirs.len(),
        paths.library_dirs.len()
    );
    let resolver = Resolver::new(SystemDiskInterface, config.naming.clone());
    let renderer = config.format.renderer(PATH_LIST_SEPARATOR);
    let outcome = configure(
        &resolver,
        &requirements,
        &paths,
        config.prefix.as_deref(),
        &*renderer,
        &config.config_file,
        &mut reporter,
    )
    .context("configuration failed")?;

    match &outcome {
        Configured::Written { path, .. } => {
            reporter.emit(format_args!("Configuration saved to: {}\n", path.display()))
        }
        Configured::Incomplete(_) => reporter.emit(format_args!(
            "WARNING: configuration not created because of missing files\n"
        )),
    }
    let out = reporter.finish().context("writing progress")?;
    Ok((outcome, paths, out))
}

pub fn read_flags(config_file: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(config_file).with_context(|| {
        format!(
            "reading {}; run `depconf configure` first",
            config_file.display()
        )
    })?;
    let config = ini::parse(&text, PATH_LIST_SEPARATOR)
        .with_context(|| format!("parsing {}", config_file.display()))?;
    let flags = config.compiler_flags();
    info!("{} flags from {}", flags.len(), config_file.display());
    Ok(flags)
}

/// Returns whether the command succeeded. An incomplete configuration is a
/// failure the caller must turn into a non-zero exit.
pub fn run(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(true)
        }
        Command::Flags { config_file, .. } => {
            println!("{}", read_flags(&config_file)?.join(" "));
            Ok(true)
        }
        Command::Configure(config) => {
            let project = std::env::current_dir().context("finding the project directory")?;
            let defaults = DefaultSearchPaths::system(project);
            let (outcome, paths, _) = run_configure(&config, &defaults, io::stdout())?;
            if !outcome.is_success() {
                eprint!("{}", remediation(&outcome, &paths));
            }
            Ok(outcome.is_success())
        }
    }
}
