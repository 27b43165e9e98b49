//! Rebuild decision: compare the persisted revision with the remote one.

use std::fmt;

use tutpage_shared::BuildInfo;

/// Why a build is (or is not) going ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildDecision {
    /// No usable build record exists.
    FirstBuild,
    /// The remote moved on since the last build.
    RevisionChanged { previous: String },
    /// Same revision, but the caller asked for a rebuild anyway.
    Forced,
    /// Same revision; nothing to do.
    UpToDate,
}

impl RebuildDecision {
    /// Whether the pipeline should fetch and render.
    pub fn should_build(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

impl fmt::Display for RebuildDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstBuild => write!(f, "first build"),
            Self::RevisionChanged { previous } => write!(f, "revision changed since {previous}"),
            Self::Forced => write!(f, "forced"),
            Self::UpToDate => write!(f, "up to date"),
        }
    }
}

/// Decide whether to rebuild given the last build record and the remote SHA.
pub fn needs_rebuild(previous: Option<&BuildInfo>, latest_sha: &str, force: bool) -> RebuildDecision {
    match previous {
        None => RebuildDecision::FirstBuild,
        Some(info) if info.sha != latest_sha => RebuildDecision::RevisionChanged {
            previous: info.sha.clone(),
        },
        Some(_) if force => RebuildDecision::Forced,
        Some(_) => RebuildDecision::UpToDate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(sha: &str) -> BuildInfo {
        BuildInfo {
            sha: sha.into(),
            build_at_ms: 1,
        }
    }

    #[test]
    fn no_record_is_first_build() {
        let d = needs_rebuild(None, "abc", false);
        assert_eq!(d, RebuildDecision::FirstBuild);
        assert!(d.should_build());
    }

    #[test]
    fn different_sha_rebuilds() {
        let d = needs_rebuild(Some(&info("old")), "new", false);
        assert_eq!(
            d,
            RebuildDecision::RevisionChanged {
                previous: "old".into()
            }
        );
        assert!(d.should_build());
    }

    #[test]
    fn same_sha_is_up_to_date() {
        let d = needs_rebuild(Some(&info("abc")), "abc", false);
        assert_eq!(d, RebuildDecision::UpToDate);
        assert!(!d.should_build());
    }

    #[test]
    fn force_overrides_up_to_date_only() {
        assert_eq!(
            needs_rebuild(Some(&info("abc")), "abc", true),
            RebuildDecision::Forced
        );
        // A real change is still reported as such when forced.
        assert!(matches!(
            needs_rebuild(Some(&info("a")), "b", true),
            RebuildDecision::RevisionChanged { .. }
        ));
        assert_eq!(needs_rebuild(None, "abc", true), RebuildDecision::FirstBuild);
    }
}
