//! Shared fixtures for unit tests: materialize a source map into a temp
//! directory and run the loader over it.

use std::fs;
use std::io;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use statelift_core::config::Config;
use statelift_core::loader::Loader;
use statelift_core::program::Program;

use crate::load::GoLoader;

pub(crate) fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }
}

pub(crate) fn load_fixture(files: &[(&str, &str)], entry: &str) -> Program {
    load_with(files, entry, false)
}

pub(crate) fn load_fixture_with_tests(files: &[(&str, &str)], entry: &str) -> Program {
    load_with(files, entry, true)
}

fn load_with(files: &[(&str, &str)], entry: &str, include_tests: bool) -> Program {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path(), files);
    let config = Config {
        entry_path: entry.to_string(),
        root_path: "root".to_string(),
        root_dir: tmp.path().to_path_buf(),
        include_tests,
    };
    GoLoader::new()
        .load(&config, &CancellationToken::new(), &mut io::sink())
        .unwrap()
}
