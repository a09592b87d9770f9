//! Build script for spotetl.
//!
//! Copies the configuration templates into the user's local data directory so
//! that a fresh install has ready-to-edit examples where the binary looks for
//! its configuration:
//!
//! - Linux: `~/.local/share/spotetl/`
//! - macOS: `~/Library/Application Support/spotetl/`
//! - Windows: `%LOCALAPPDATA%/spotetl/`
//!
//! Nothing here fails the build. Missing templates, an unknown data directory
//! or a read-only home all turn into `cargo:warning` lines.

use std::{env, fs, path::PathBuf};

const TEMPLATES: [&str; 2] = [".env.example", "variables.example.toml"];

fn main() {
    for template in TEMPLATES {
        println!("cargo:rerun-if-changed={template}");
    }

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping template copy");
        return;
    };

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotetl");
    if let Err(e) = fs::create_dir_all(&out_dir) {
        println!(
            "cargo:warning=cannot create {}: {}",
            out_dir.display(),
            e
        );
        return;
    }

    for template in TEMPLATES {
        let source = manifest_dir.join(template);
        if !source.is_file() {
            println!("cargo:warning={} not found at {}", template, source.display());
            continue;
        }

        if let Err(e) = fs::copy(&source, out_dir.join(template)) {
            println!("cargo:warning=cannot copy {}: {}", template, e);
        }
    }
}
