pub mod cancel;
pub mod fast_map;

use std::path::Path;

/// Registry and include-table key for a path: lower-cased, forward slashes.
pub fn document_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}
