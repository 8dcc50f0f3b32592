use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Overrides `config/reflex.toml`, relative to the package root.
const CONFIG_ENV: &str = "REFLEX_CONFIG";

fn config_path(root: &Path) -> PathBuf {
    match env::var_os(CONFIG_ENV) {
        Some(path) => root.join(path),
        None => root.join("config").join("reflex.toml"),
    }
}

fn compile(config: &Path, out_dir: &Path) -> Result<(), String> {
    let source = reflex_config_compiler::generate_from_path(config)
        .map_err(|e| format!("{}: {e}", config.display()))?;
    let target = out_dir.join("reflex_config.rs");
    fs::write(&target, source).map_err(|e| format!("writing {}: {e}", target.display()))
}

fn main() {
    let (Some(root), Some(out_dir)) = (env::var_os("CARGO_MANIFEST_DIR"), env::var_os("OUT_DIR"))
    else {
        panic!("build script must run under cargo");
    };
    let config = config_path(Path::new(&root));

    println!("cargo:rerun-if-env-changed={CONFIG_ENV}");
    println!("cargo:rerun-if-changed={}", config.display());

    if let Err(err) = compile(&config, Path::new(&out_dir)) {
        panic!("reflex config compile failed: {err}");
    }
}
