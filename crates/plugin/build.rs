use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        return;
    };

    // Generate C header from Rust exports
    let output_path = manifest_dir.join("include/srcsdk.h");
    let config = cbindgen::Config::from_file(manifest_dir.join("cbindgen.toml")).unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&manifest_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&output_path);
        }
        Err(e) => println!("cargo:warning=header generation skipped: {}", e),
    }
}
