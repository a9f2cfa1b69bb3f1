use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "prepdeck", "PrepDeck") {
        pd.data_dir().to_path_buf()
    } else {
        // no home directory: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn config_file() -> PathBuf {
    match ProjectDirs::from("com", "prepdeck", "PrepDeck") {
        Some(pd) => pd.config_dir().join("prepdeck.toml"),
        None => data_root().join("prepdeck.toml"),
    }
}

pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    let file = root.join("prepdeck.json");
    let backups = root.join("backups");
    (file, backups)
}
