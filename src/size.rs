use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::{debug, warn};

/// Best-effort disk space picture taken before a run starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Sum of input sizes; the output of a stream-copy concat is about this big
    pub estimated_output_bytes: Option<u64>,
    pub tmp_free_bytes: Option<u64>,
    pub dest_free_bytes: Option<u64>,
    pub tmp_dir: Option<PathBuf>,
    pub dest_dir: Option<PathBuf>,
    pub had_errors: bool,
    pub errors: Vec<String>,
}

impl SizeEstimate {
    fn record_error(&mut self, message: String) {
        warn!("Size estimation: {}", message);
        self.had_errors = true;
        self.errors.push(message);
    }

    /// Space needed while both the concatenated and the final file exist
    pub fn required_bytes(&self) -> Option<u64> {
        self.estimated_output_bytes.map(|size| size.saturating_mul(2))
    }

    pub fn summary(&self) -> String {
        format!(
            "estimated result size: {} (2x: {}), {}: {}, {}: {}{}",
            format_size(self.estimated_output_bytes),
            format_size(self.required_bytes()),
            format_path(self.tmp_dir.as_deref()),
            format_size(self.tmp_free_bytes),
            format_path(self.dest_dir.as_deref()),
            format_size(self.dest_free_bytes),
            if self.had_errors {
                " (some errors occurred, values may be incorrect)"
            } else {
                ""
            }
        )
    }
}

/// Measures input sizes and free space; never fails
#[derive(Debug, Clone, Default)]
pub struct SizeEstimator;

impl SizeEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, files: &[PathBuf], tmp_root: &Path) -> SizeEstimate {
        let mut estimate = SizeEstimate::default();
        let disks = Disks::new_with_refreshed_list();

        match std::fs::canonicalize(tmp_root) {
            Ok(tmp_dir) => {
                estimate.tmp_free_bytes = available_space(&disks, &tmp_dir);
                if estimate.tmp_free_bytes.is_none() {
                    estimate.record_error(format!("no disk found for {}", tmp_dir.display()));
                }
                estimate.tmp_dir = Some(tmp_dir);
            }
            Err(e) => estimate.record_error(format!("{}: {}", tmp_root.display(), e)),
        }

        for (index, file) in files.iter().enumerate() {
            let path = match std::fs::canonicalize(file) {
                Ok(path) => path,
                Err(e) => {
                    estimate.record_error(format!("{}: {}", file.display(), e));
                    continue;
                }
            };

            if index == 0 {
                if let Some(dest_dir) = path.parent() {
                    estimate.dest_free_bytes = available_space(&disks, dest_dir);
                    if estimate.dest_free_bytes.is_none() {
                        estimate.record_error(format!("no disk found for {}", dest_dir.display()));
                    }
                    estimate.dest_dir = Some(dest_dir.to_path_buf());
                }
            }

            match std::fs::metadata(&path) {
                Ok(metadata) => {
                    let total = estimate.estimated_output_bytes.unwrap_or(0);
                    estimate.estimated_output_bytes = Some(total.saturating_add(metadata.len()));
                }
                Err(e) => estimate.record_error(format!("{}: {}", path.display(), e)),
            }
        }

        debug!("Size estimate: {}", estimate.summary());
        estimate
    }
}

/// Free bytes on the disk with the longest mount point containing `path`
fn available_space(disks: &Disks, path: &Path) -> Option<u64> {
    disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}

/// Human-readable size with binary units, `N/A` when unknown
pub fn format_size(size: Option<u64>) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * KIB;
    const GIB: f64 = 1024.0 * MIB;
    const TIB: f64 = 1024.0 * GIB;

    let Some(size) = size else {
        return "N/A".to_string();
    };
    let bytes = size as f64;
    if bytes < KIB {
        format!("{size}B")
    } else if bytes < MIB {
        format!("{:.2}KiB", bytes / KIB)
    } else if bytes < GIB {
        format!("{:.2}MiB", bytes / MIB)
    } else if bytes < TIB {
        format!("{:.2}GiB", bytes / GIB)
    } else {
        format!("{:.2}TiB", bytes / TIB)
    }
}

fn format_path(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "N/A");
        assert_eq!(format_size(Some(512)), "512B");
        assert_eq!(format_size(Some(1536)), "1.50KiB");
        assert_eq!(format_size(Some(5 * 1024 * 1024)), "5.00MiB");
        assert_eq!(format_size(Some(3 * 1024 * 1024 * 1024)), "3.00GiB");
    }

    #[test]
    fn test_estimate_sums_input_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("part1.mp4");
        let second = temp_dir.path().join("part2.mp4");
        std::fs::write(&first, vec![0u8; 1000]).unwrap();
        std::fs::write(&second, vec![0u8; 500]).unwrap();

        let estimate = SizeEstimator::new().estimate(&[first, second], temp_dir.path());

        assert_eq!(estimate.estimated_output_bytes, Some(1500));
        assert_eq!(estimate.required_bytes(), Some(3000));
        assert!(estimate.dest_dir.is_some());
    }

    #[test]
    fn test_estimate_collects_errors() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.mp4");
        std::fs::write(&present, vec![0u8; 10]).unwrap();
        let missing = temp_dir.path().join("missing.mp4");

        let estimate = SizeEstimator::new().estimate(&[missing, present], &temp_dir.path().join("gone"));

        assert!(estimate.had_errors);
        assert!(estimate.errors.len() >= 2);
        assert_eq!(estimate.estimated_output_bytes, Some(10));
        assert!(estimate.tmp_free_bytes.is_none());
        // destination is measured only from the first file
        assert!(estimate.dest_dir.is_none());
        assert!(estimate.summary().contains("some errors occurred"));
    }
}
