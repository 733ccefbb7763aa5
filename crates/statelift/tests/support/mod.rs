//! Test support: materialize a source map under a temp directory, run the
//! transformer in place, and read the resulting tree back for comparison.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use statelift::{Config, FsEmitter, GoLoader, LiftResult};

/// Write a relative-path → contents map under `dir`.
pub fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }
}

/// Read every file under `dir` into a relative-path → contents map.
pub fn read_tree(dir: &Path) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    read_into(dir, dir, &mut found);
    found
}

fn read_into(root: &Path, dir: &Path, found: &mut BTreeMap<String, String>) {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            read_into(root, &path, found);
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            found.insert(rel, fs::read_to_string(&path).unwrap());
        }
    }
}

/// Run the transformer in place over `files` rooted at `root` and return
/// the resulting tree.
pub fn run_in_place(
    files: &[(&str, &str)],
    entry: &str,
    include_tests: bool,
) -> LiftResult<BTreeMap<String, String>> {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path(), files);
    let config = Config {
        entry_path: entry.to_string(),
        root_path: "root".to_string(),
        root_dir: tmp.path().to_path_buf(),
        include_tests,
    };
    let mut emitter = FsEmitter::new();
    statelift::run(
        &config,
        &GoLoader::new(),
        &mut emitter,
        &CancellationToken::new(),
        &mut io::sink(),
    )?;
    Ok(read_tree(tmp.path()))
}

/// Compare a transformed tree file-by-file against the expected map.
pub fn compare_tree(found: &BTreeMap<String, String>, expect: &[(&str, &str)]) {
    let expect: BTreeMap<String, String> = expect
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let found_keys: Vec<&String> = found.keys().collect();
    let expect_keys: Vec<&String> = expect.keys().collect();
    assert_eq!(
        expect_keys, found_keys,
        "file sets differ\nexpect: {:?}\nfound : {:?}",
        expect_keys, found_keys
    );

    for (path, want) in &expect {
        let got = &found[path];
        assert_eq!(
            want, got,
            "{} differs\n--- expect ---\n{}\n--- found ---\n{}",
            path, want, got
        );
    }
}
