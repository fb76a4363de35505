//! Propagates the workspace `VERSION` file into `FILE_GATE_VERSION`.

use std::path::Path;
use std::{env, fs};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let version_file = Path::new(&manifest_dir)
        .ancestors()
        .nth(2)
        .expect("crate lives two levels below the workspace root")
        .join("VERSION");

    println!("cargo:rerun-if-changed={}", version_file.display());

    let contents = fs::read_to_string(&version_file)
        .unwrap_or_else(|error| panic!("cannot read {}: {error}", version_file.display()));
    let version = contents.trim();
    assert!(!version.is_empty(), "{} is empty", version_file.display());

    println!("cargo:rustc-env=FILE_GATE_VERSION={version}");
}
