use std::path::PathBuf;
use std::{env, fs};

/// Storage format tag, bump on layout changes of stored records
const STORAGE_FORMAT: &str = "latchkey-storage-v1";

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(
        out_dir.join("constants.rs"),
        format!("pub(crate) const BUILD_HASH: u32 = {:#010x};\n", compute_build_hash()),
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}

/// Compute the hash saved with the storage config. A mismatch at boot means
/// the records on flash were written by an incompatible firmware, so the
/// storage area is erased and re-initialized.
fn compute_build_hash() -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(env::var("CARGO_PKG_VERSION").unwrap_or_default().as_bytes());
    hasher.update(STORAGE_FORMAT.as_bytes());
    hasher.finalize()
}
