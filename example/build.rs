use std::{env, error::Error, path::PathBuf};

use protowire::Config;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=proto");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let mut config = Config::new();
    config
        .include_path("proto")
        .emit_runtime(false)
        .runtime_path("::protowire_runtime");
    protowire::compile_with_config(&config, &["geometry.proto", "scalars.proto"], &out_dir)?;
    Ok(())
}
