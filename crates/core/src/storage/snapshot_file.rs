use crate::domain::snapshot::SignalSnapshot;
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace the snapshot at `path` in one step: the JSON goes to a sibling
/// `.tmp` file which is then renamed over the target, so readers see either
/// the previous record or the new one.
pub fn write_snapshot_atomic(path: &Path, snapshot: &SignalSnapshot) -> anyhow::Result<()> {
    let body = to_pretty_json(snapshot)?;
    let tmp_path = tmp_path_for(path);

    let write_tmp = || -> anyhow::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        file.write_all(&body)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
        Ok(())
    };

    if let Err(err) = write_tmp() {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("failed to publish snapshot to {}", path.display()));
    }

    tracing::info!(path = %path.display(), bytes = body.len(), "snapshot written");
    Ok(())
}

pub fn read_snapshot(path: &Path) -> anyhow::Result<SignalSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid snapshot", path.display()))
}

/// Four-space indented JSON, field order as declared.
pub fn to_pretty_json(snapshot: &SignalSnapshot) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot
        .serialize(&mut ser)
        .context("failed to serialize snapshot")?;
    Ok(buf)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
