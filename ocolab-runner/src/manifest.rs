//! Run manifest export (JSON), written next to the trade log.

use anyhow::{Context, Result};
use ocolab_core::engine::SimStats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::summary::TradeSummary;

/// Everything needed to tell two runs apart, or to reproduce one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub config_hash: String,
    pub dataset_hash: String,
    pub latency_ms: u64,
    pub trade_count: usize,
    pub stats: SimStats,
    pub summary: TradeSummary,
}

impl RunManifest {
    /// Short identity derived from config, data and latency.
    pub fn run_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.config_hash.as_bytes());
        hasher.update(self.dataset_hash.as_bytes());
        hasher.update(&self.latency_ms.to_le_bytes());
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }
}

/// `trades.csv` → `trades.csv.manifest.json`.
pub fn manifest_path(out: &Path) -> PathBuf {
    let mut name = out.as_os_str().to_owned();
    name.push(".manifest.json");
    PathBuf::from(name)
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<RunManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(latency_ms: u64) -> RunManifest {
        RunManifest {
            schema_version: 1,
            config_hash: "c".repeat(64),
            dataset_hash: "d".repeat(64),
            latency_ms,
            trade_count: 0,
            stats: SimStats::default(),
            summary: TradeSummary::from_trades(&[]),
        }
    }

    #[test]
    fn path_appends_suffix() {
        assert_eq!(
            manifest_path(Path::new("out/trades.csv")),
            PathBuf::from("out/trades.csv.manifest.json")
        );
    }

    #[test]
    fn run_id_depends_on_inputs_only() {
        let a = manifest(250);
        let mut b = manifest(250);
        b.trade_count = 7;
        assert_eq!(a.run_id(), b.run_id());
        assert_ne!(a.run_id(), manifest(0).run_id());
        assert_eq!(a.run_id().len(), 16);
    }

    #[test]
    fn written_manifest_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv.manifest.json");
        let m = manifest(100);
        write_manifest(&path, &m).unwrap();
        let back = read_manifest(&path).unwrap();
        assert_eq!(back, m);
    }
}
