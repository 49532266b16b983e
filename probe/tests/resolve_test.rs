use depconf_config::{Format, IniRenderer, PATH_LIST_SEPARATOR};
use depconf_paths::{assemble, DefaultSearchPaths, Overrides};
use depconf_probe::{
    configure, Configured, DependencySpec, LibraryNaming, NullReporter, Requirements,
    ResolveError, Resolver, Status, SystemDiskInterface,
};
use std::{fs, path::Path};
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

struct Tree {
    root: TempDir,
}

impl Tree {
    fn new(files: &[&str]) -> Tree {
        let root = tempfile::tempdir().unwrap();
        for f in files {
            touch(&root.path().join(f));
        }
        Tree { root }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.root.path().join(rel)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            include_dirs: vec![self.path("inc")],
            library_dirs: vec![self.path("lib")],
            prefix: None,
        }
    }
}

fn requirements() -> Requirements {
    Requirements {
        headers: vec!["a.h".into(), "b.h".into()],
        libraries: vec!["foo".into()],
    }
}

fn resolver() -> Resolver<SystemDiskInterface> {
    Resolver::new(SystemDiskInterface, LibraryNaming::unix())
}

#[test]
fn everything_present_writes_config() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    let dest = tree.path("setup.cfg");

    let outcome = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap();
    assert!(outcome.is_success());

    let expected = format!(
        "[build_ext]\nlibrary_dirs = {}\ninclude_dirs = {}\nlibraries = foo\n\n",
        tree.path("lib").display(),
        tree.path("inc").display()
    );
    assert_eq!(fs::read_to_string(&dest).unwrap(), expected);
}

#[test]
fn missing_header_writes_nothing() {
    let tree = Tree::new(&["inc/a.h", "lib/libfoo.so"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    let dest = tree.path("setup.cfg");

    let outcome = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap();

    assert!(!outcome.is_success());
    let resolution = outcome.resolution();
    assert_eq!(
        resolution.status(&DependencySpec::header("b.h")),
        Some(&Status::Missing)
    );
    assert!(resolution.status(&DependencySpec::header("a.h")).unwrap().is_found());
    assert!(resolution.libraries_found());
    match resolution.missing().as_slice() {
        [ResolveError::MissingHeader(name)] => assert_eq!(name, "b.h"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!dest.exists());
}

#[test]
fn failure_leaves_existing_config_untouched() {
    let tree = Tree::new(&["inc/a.h"]);
    let dest = tree.path("setup.cfg");
    fs::write(&dest, "[build_ext]\nold = 1\n").unwrap();
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());

    let outcome = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap();
    assert!(matches!(outcome, Configured::Incomplete(_)));
    assert_eq!(fs::read_to_string(&dest).unwrap(), "[build_ext]\nold = 1\n");
}

#[test]
fn static_only_library_resolves() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.a"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    let resolution = resolver().resolve(&requirements(), &paths, &mut NullReporter);
    assert!(resolution.is_complete());
    assert_eq!(
        resolution.status(&DependencySpec::library("foo")),
        Some(&Status::Found(tree.path("lib/libfoo.a")))
    );
}

#[test]
fn prefix_is_searched_and_recorded() {
    let tree = Tree::new(&["prefix/include/a.h", "prefix/include/b.h", "prefix/lib/libfoo.so"]);
    let prefix = tree.path("prefix");
    let overrides = Overrides {
        prefix: Some(prefix.clone()),
        ..tree.overrides()
    };
    let paths = assemble(&DefaultSearchPaths::empty(), &overrides);
    assert_eq!(paths.include_dirs.last(), Some(&prefix.join("include")));
    assert_eq!(paths.library_dirs.last(), Some(&prefix.join("lib")));

    let dest = tree.path("setup.cfg");
    let outcome = configure(
        &resolver(),
        &requirements(),
        &paths,
        Some(prefix.as_path()),
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap();
    assert!(outcome.is_success());
    let written = fs::read_to_string(&dest).unwrap();
    assert!(written.starts_with(&format!("[install]\nprefix = {}\n\n", prefix.display())));
}

#[test]
fn reruns_are_byte_identical() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let defaults = DefaultSearchPaths {
        include_dirs: vec![],
        library_dirs: vec![tree.path("sys")],
        multilib: true,
    };
    let dest = tree.path("setup.cfg");
    let renderer = Format::Ini.renderer(PATH_LIST_SEPARATOR);

    let mut outputs = vec![];
    for _ in 0..2 {
        let paths = assemble(&defaults, &tree.overrides());
        configure(
            &resolver(),
            &requirements(),
            &paths,
            None,
            &*renderer,
            &dest,
            &mut NullReporter,
        )
        .unwrap();
        outputs.push(fs::read(&dest).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn unwritable_destination_is_fatal() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    let dest = tree.path("no/such/dir/setup.cfg");

    let err = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap_err();
    match err {
        ResolveError::ConfigWrite { path, .. } => assert_eq!(path, dest),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn failed_replace_keeps_previous_artifact() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    // A non-empty directory where the artifact should go cannot be renamed over.
    let dest = tree.path("setup.cfg");
    touch(&dest.join("keep"));

    let err = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap_err();
    match err {
        ResolveError::ConfigWrite { path, .. } => assert_eq!(path, dest),
        other => panic!("unexpected {:?}", other),
    }

    assert!(dest.join("keep").is_file());
    let mut left: Vec<_> = fs::read_dir(tree.root.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    left.sort();
    assert_eq!(left, vec!["inc", "lib", "setup.cfg"]);
}

#[test]
fn render_error_keeps_previous_artifact() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let dest = tree.path("setup.cfg");
    fs::write(&dest, "[build_ext]\nold = 1\n").unwrap();
    let mut overrides = tree.overrides();
    overrides.include_dirs.push(tree.path("odd:dir"));
    let paths = assemble(&DefaultSearchPaths::empty(), &overrides);

    let err = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap_err();
    assert!(matches!(err, ResolveError::Render(_)));
    assert_eq!(fs::read_to_string(&dest).unwrap(), "[build_ext]\nold = 1\n");
}

#[test]
fn rewrite_replaces_previous_artifact() {
    let tree = Tree::new(&["inc/a.h", "inc/b.h", "lib/libfoo.so"]);
    let paths = assemble(&DefaultSearchPaths::empty(), &tree.overrides());
    let dest = tree.path("setup.cfg");
    fs::write(&dest, "[build_ext]\nold = 1\n").unwrap();

    let outcome = configure(
        &resolver(),
        &requirements(),
        &paths,
        None,
        &IniRenderer::new(':'),
        &dest,
        &mut NullReporter,
    )
    .unwrap();
    assert!(outcome.is_success());
    let written = fs::read_to_string(&dest).unwrap();
    assert!(written.ends_with("libraries = foo\n\n"));
    assert!(!written.contains("old = 1"));
}
