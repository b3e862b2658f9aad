use std::path::Path;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::db::*;
use crate::record::NoteRecord;

mod notes;
mod open;

pub(super) fn config_for(path: &Path) -> StoreConfig {
    StoreConfig {
        store_path: Some(path.to_path_buf()),
        ..Default::default()
    }
}

pub(super) fn open_index(path: &Path) -> NoteIndex {
    NoteIndex::initialize(&config_for(path)).unwrap()
}

/// Run a script directly against a store file, outside the adapter
pub(super) fn raw(path: &Path, script: &str) -> ExecOutput {
    let mut exec = EmbeddedExecutor::open(path).unwrap();
    exec.run(script, &RunOptions::structured(Duration::from_secs(5)))
        .unwrap()
}

pub(super) fn sample(path: &str) -> NoteRecord {
    NoteRecord::new(path, "A")
        .with_content("hello world")
        .with_tags(["#x", "#y"])
        .with_frontmatter("k", "v")
        .with_timestamps(1, 2)
}

pub(super) fn tag_names(index: &NoteIndex, path: &str) -> Vec<String> {
    index
        .tags_for(path)
        .unwrap()
        .into_iter()
        .map(|t| t.tag_name)
        .collect()
}
