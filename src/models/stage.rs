//! Stage identifier parsing and status helpers

use std::fmt;
use std::str::FromStr;

use crate::models::{StageKind, StageStatus};

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Build => "build",
            StageKind::Test => "test",
            StageKind::Deploy => "deploy",
        }
    }

    /// Human readable description of what the stage does, used in logs
    pub fn action(&self) -> &'static str {
        match self {
            StageKind::Build => "Building code",
            StageKind::Test => "Running tests",
            StageKind::Deploy => "Deploying code",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage identifiers are matched exactly; `Build` is not a recognized stage.
impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(StageKind::Build),
            "test" => Ok(StageKind::Test),
            "deploy" => Ok(StageKind::Deploy),
            other => Err(format!("unrecognized stage '{}'", other)),
        }
    }
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Success => "success",
            StageStatus::Failure => "failure",
            StageStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_kind() {
        assert_eq!("build".parse::<StageKind>().unwrap(), StageKind::Build);
        assert_eq!("test".parse::<StageKind>().unwrap(), StageKind::Test);
        assert_eq!("deploy".parse::<StageKind>().unwrap(), StageKind::Deploy);

        assert!("lint".parse::<StageKind>().is_err());
        assert!("Build".parse::<StageKind>().is_err());
        assert!("".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_stage_status_serialization() {
        let json = serde_json::to_string(&StageStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");

        let status: StageStatus = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(status, StageStatus::Unknown);
        assert_eq!(status.to_string(), "unknown");
    }
}
