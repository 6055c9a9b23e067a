//! Low-level helpers shared by the tix crates.
//!
//! Provides the atomic state-file writer and the unix-millisecond clock helpers
//! used for counter persistence and close-confirmation deadlines.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::{read_json_or_default, write_json_atomic, write_text_atomic};
pub use time_utils::{current_unix_timestamp_ms, deadline_after_ms, is_deadline_elapsed};

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u64,
    }

    #[test]
    fn unit_deadline_after_ms_saturates() {
        assert_eq!(deadline_after_ms(u64::MAX - 1, 10), u64::MAX);
        assert_eq!(deadline_after_ms(1_000, 60_000), 61_000);
    }

    #[test]
    fn unit_is_deadline_elapsed_is_inclusive() {
        assert!(!is_deadline_elapsed(1_000, 999));
        assert!(is_deadline_elapsed(1_000, 1_000));
        assert!(is_deadline_elapsed(1_000, 1_001));
    }

    #[test]
    fn functional_write_text_atomic_replaces_existing_content() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("nested").join("state.json");
        write_text_atomic(&path, "first").expect("write first");
        write_text_atomic(&path, "second").expect("write second");
        assert_eq!(read_to_string(&path).expect("read"), "second");

        let leftovers = std::fs::read_dir(path.parent().expect("parent"))
            .expect("list")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn regression_write_text_atomic_rejects_directory_destination() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let error = write_text_atomic(tempdir.path(), "x").expect_err("directory must fail");
        assert!(error.to_string().contains("is a directory"));
    }

    #[test]
    fn functional_json_helpers_default_when_missing_and_round_trip() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("sample.json");
        let loaded: Sample = read_json_or_default(&path).expect("missing file");
        assert_eq!(loaded, Sample::default());

        write_json_atomic(&path, &Sample { count: 7 }).expect("write");
        let reloaded: Sample = read_json_or_default(&path).expect("reload");
        assert_eq!(reloaded, Sample { count: 7 });
    }

    #[test]
    fn regression_read_json_or_default_surfaces_corrupt_file() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("sample.json");
        std::fs::write(&path, "{\"count\":").expect("seed");
        let error = read_json_or_default::<Sample>(&path).expect_err("corrupt");
        assert!(error.to_string().contains("failed to parse"));
    }
}
