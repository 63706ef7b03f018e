// ============================================================
// Layer 4 — Recording Loader
// ============================================================
// Reads the two plain-text inputs of a run:
//
//   File lists: one recording id per line, e.g.
//       1_12
//       1_13
//     turned into archive / label paths by joining a directory
//     and appending an extension.
//
//   Label files: one per recording. Only every 4th line
//     (line index 3, 7, 11, ...) is used and holds
//       <x> <y>
//     as whitespace-separated floats. All other lines are
//     ignored. A file of 4k lines therefore yields k points.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use ndarray::Array2;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::error::DatasetError;

/// Line index of the first labelled line, and the step between them
const LABEL_LINE_OFFSET: usize = 3;
const LABEL_LINE_STEP:   usize = 4;

/// Read a file list: one recording id per line, blank lines skipped.
pub fn load_filenames(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read file list '{}'", path.display()))?;

    let ids: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!("Read {} recording ids from '{}'", ids.len(), path.display());
    Ok(ids)
}

/// `<dir>/<id><extension>` for every id
pub fn recording_paths(ids: &[String], dir: impl AsRef<Path>, extension: &str) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    ids.iter()
        .map(|id| dir.join(format!("{id}{extension}")))
        .collect()
}

/// Read a label file and keep one (x, y) pair per 4 lines.
///
/// Returns a `[k, 2]` array in file order.
pub fn read_label_file(path: &Path) -> Result<Array2<f32>, DatasetError> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;

    let mut coords = Vec::new();
    for (line_no, line) in text
        .lines()
        .enumerate()
        .skip(LABEL_LINE_OFFSET)
        .step_by(LABEL_LINE_STEP)
    {
        let [x, y] = parse_point(line).map_err(|message| DatasetError::Parse {
            path: path.to_path_buf(),
            line: line_no + 1,
            message,
        })?;
        coords.push(x);
        coords.push(y);
    }

    let rows = coords.len() / 2;
    Array2::from_shape_vec((rows, 2), coords)
        .map_err(|e| DatasetError::format(path, e.to_string()))
}

/// Parse exactly two whitespace-separated floats.
fn parse_point(line: &str) -> Result<[f32; 2], String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let &[x, y] = tokens.as_slice() else {
        return Err(format!("expected 2 values, found {} in {:?}", tokens.len(), line));
    };

    let parse = |s: &str| {
        s.parse::<f32>()
            .map_err(|e| format!("'{s}' is not a number: {e}"))
    };
    Ok([parse(x)?, parse(y)?])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_keeps_every_fourth_line() {
        let mut text = String::new();
        for k in 0..5 {
            text.push_str("header a\nheader b\nheader c\n");
            text.push_str(&format!("{} {}\n", k as f32 * 2.0, k as f32 * 3.0));
        }
        let f      = write_temp(&text);
        let labels = read_label_file(f.path()).unwrap();

        assert_eq!(labels.dim(), (5, 2));
        assert_eq!(labels[[4, 0]], 8.0);
        assert_eq!(labels[[4, 1]], 12.0);
    }

    #[test]
    fn test_other_lines_are_ignored() {
        // Lines 0-2 and 4-6 are not parsed even though they are garbage
        let f      = write_temp("x\ny\nz\n1.5 2.5\nnot numbers\n\n???\n3 4\n");
        let labels = read_label_file(f.path()).unwrap();
        assert_eq!(labels.dim(), (2, 2));
        assert_eq!(labels[[0, 1]], 2.5);
    }

    #[test]
    fn test_wrong_token_count_is_a_parse_error() {
        let f   = write_temp("a\nb\nc\n1.0 2.0 3.0\n");
        let err = read_label_file(f.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_non_numeric_is_a_parse_error() {
        let f   = write_temp("a\nb\nc\n1.0 abc\n");
        let err = read_label_file(f.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_missing_label_file_is_io_error() {
        let err = read_label_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_file_list_and_paths() {
        let f   = write_temp("1_12\n\n  1_13  \n");
        let ids = load_filenames(f.path()).unwrap();
        assert_eq!(ids, vec!["1_12", "1_13"]);

        let paths = recording_paths(&ids, "/data/train", ".npy");
        assert_eq!(paths[1], PathBuf::from("/data/train/1_13.npy"));
    }
}
