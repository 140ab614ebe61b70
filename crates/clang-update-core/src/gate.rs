//! Decisions that end a run early without doing any work.

use crate::config::{BuildDefines, Revision};
use serde::{Deserialize, Serialize};

/// Why an update was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither `clang=1` nor `asan=1` in `GYP_DEFINES`.
    ClangNotEnabled,

    /// `make_clang_dir=` points at a prebuilt toolchain.
    PrebuiltClangDir,

    /// The stamp already records the target revision.
    UpToDate { revision: String },
}

impl SkipReason {
    pub fn message(&self) -> String {
        match self {
            SkipReason::ClangNotEnabled => {
                "Skipping Clang update (clang=1 was not set in GYP_DEFINES).".to_string()
            }
            SkipReason::PrebuiltClangDir => {
                "Skipping Clang update (make_clang_dir= was set in GYP_DEFINES).".to_string()
            }
            SkipReason::UpToDate { .. } => "Already up to date.".to_string(),
        }
    }
}

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Proceed,
    Skip(SkipReason),
}

/// Update gate rules.
pub struct UpdateGate;

impl UpdateGate {
    /// Check the build configuration flags.
    pub fn evaluate_defines(defines: &BuildDefines) -> GateVerdict {
        if !defines.clang_enabled() {
            return GateVerdict::Skip(SkipReason::ClangNotEnabled);
        }
        if defines.uses_prebuilt_clang_dir() {
            return GateVerdict::Skip(SkipReason::PrebuiltClangDir);
        }
        GateVerdict::Proceed
    }

    /// `true` iff `target` is a pinned revision and `stamp` records it.
    ///
    /// `HEAD` can never be up to date.
    pub fn is_up_to_date(target: &Revision, stamp: &str) -> bool {
        !target.is_head() && stamp == target.as_str()
    }

    /// Check the recorded stamp against the target revision.
    pub fn evaluate_stamp(target: &Revision, stamp: &str) -> GateVerdict {
        if Self::is_up_to_date(target, stamp) {
            GateVerdict::Skip(SkipReason::UpToDate {
                revision: target.to_string(),
            })
        } else {
            GateVerdict::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defines_without_clang_skip() {
        let verdict = UpdateGate::evaluate_defines(&BuildDefines::new("component=shared_library"));
        assert_eq!(verdict, GateVerdict::Skip(SkipReason::ClangNotEnabled));
    }

    #[test]
    fn test_prebuilt_dir_wins_over_clang_flag() {
        let verdict = UpdateGate::evaluate_defines(&BuildDefines::new("clang=1 make_clang_dir=/x"));
        assert_eq!(verdict, GateVerdict::Skip(SkipReason::PrebuiltClangDir));
    }

    #[test]
    fn test_clang_flag_proceeds() {
        assert_eq!(
            UpdateGate::evaluate_defines(&BuildDefines::new("asan=1")),
            GateVerdict::Proceed
        );
    }

    #[test]
    fn test_stamp_matching_pinned_revision_is_current() {
        let target = Revision::from("232554");
        assert!(UpdateGate::is_up_to_date(&target, "232554"));
        assert!(!UpdateGate::is_up_to_date(&target, "100"));
        assert!(!UpdateGate::is_up_to_date(&target, ""));
    }

    #[test]
    fn test_head_is_never_current() {
        assert!(!UpdateGate::is_up_to_date(&Revision::Head, "HEAD"));
        assert_eq!(
            UpdateGate::evaluate_stamp(&Revision::Head, "HEAD"),
            GateVerdict::Proceed
        );
    }

    #[test]
    fn test_skip_messages() {
        assert!(SkipReason::ClangNotEnabled.message().contains("clang=1 was not set"));
        assert!(SkipReason::PrebuiltClangDir.message().contains("make_clang_dir="));
        let up_to_date = SkipReason::UpToDate {
            revision: "232554".to_string(),
        };
        assert_eq!(up_to_date.message(), "Already up to date.");
    }
}
