//! Build script for likesync.
//!
//! Copies `.env.example` into the application directory under the platform
//! data directory, so a fresh install has a template next to where the
//! `.env` file is read from:
//! - Linux: `~/.local/share/likesync/.env.example`
//! - macOS: `~/Library/Application Support/likesync/.env.example`
//! - Windows: `%LOCALAPPDATA%/likesync/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("likesync");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        fs::copy(&env_example_path, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
