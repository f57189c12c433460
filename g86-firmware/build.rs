//! Build script for g86-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Checks that the CYW43 firmware blobs are present

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Blobs embedded by `tasks::wifi`, from the embassy repository's
/// `cyw43-firmware` directory
const CYW43_BLOBS: [&str; 3] = ["43439A0.bin", "43439A0_clm.bin", "nvram_rp2040.bin"];

fn main() {
    setup_linker();
    check_cyw43_firmware();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Fail early with a readable message when a blob is missing
fn check_cyw43_firmware() {
    let dir = Path::new("cyw43-firmware");
    println!("cargo:rerun-if-changed=cyw43-firmware");

    let missing: Vec<&str> = CYW43_BLOBS
        .iter()
        .copied()
        .filter(|name| !dir.join(name).exists())
        .collect();

    if !missing.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: CYW43 firmware not found                                 ║\n\
            ║                                                                  ║\n\
            ║  Copy these files from embassy's cyw43-firmware directory        ║\n\
            ║  into g86-firmware/cyw43-firmware/:                              ║\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            missing
                .iter()
                .map(|name| format!("║    • {:<60} ║", name))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}
