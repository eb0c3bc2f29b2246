use std::fmt;
use std::str::FromStr;

/// Number of a backup set; also the name of its directory under the backup root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupId(u64);

impl BackupId {
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(BackupId(value))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for BackupId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = strip_request_path(s);
        if trimmed.is_empty() {
            return Err("backup id is empty".to_string());
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("backup id {} must be a positive number", trimmed));
        }
        if trimmed.len() > 1 && trimmed.starts_with('0') {
            return Err(format!("backup id {} must not have leading zeros", trimmed));
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|e| format!("backup id {}: {}", trimmed, e))?;
        BackupId::new(value).ok_or_else(|| format!("backup id {} must be a positive number", trimmed))
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator input arrives the way the server's request paths did: "/ds", " 42 ", "/".
pub fn strip_request_path(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed.strip_prefix('/').unwrap_or(trimmed).trim()
}

pub fn request_is_empty(value: Option<&str>) -> bool {
    value.map_or(true, |v| strip_request_path(v).is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Backup,
    Restore,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Backup => "backup",
            Operation::Restore => "restore",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_id_accepts_request_paths() {
        assert_eq!("42".parse::<BackupId>().unwrap().get(), 42);
        assert_eq!("/7".parse::<BackupId>().unwrap().get(), 7);
        assert_eq!(" 3 ".parse::<BackupId>().unwrap().get(), 3);
    }

    #[test]
    fn backup_id_rejects_non_positive_and_traversal() {
        assert!("0".parse::<BackupId>().is_err());
        assert!("".parse::<BackupId>().is_err());
        assert!("-1".parse::<BackupId>().is_err());
        assert!("+5".parse::<BackupId>().is_err());
        assert!("../1".parse::<BackupId>().is_err());
        assert!("1/..".parse::<BackupId>().is_err());
    }

    #[test]
    fn backup_id_matches_directory_name() {
        assert!("007".parse::<BackupId>().is_err());
        assert!("00".parse::<BackupId>().is_err());
        let id: BackupId = "/70".parse().expect("id");
        assert_eq!(id.to_string(), "70");
    }

    #[test]
    fn empty_requests() {
        assert!(request_is_empty(None));
        assert!(request_is_empty(Some("")));
        assert!(request_is_empty(Some("   ")));
        assert!(request_is_empty(Some("/")));
        assert!(request_is_empty(Some(" / ")));
        assert!(!request_is_empty(Some("test")));
        assert!(!request_is_empty(Some("test/")));
        assert!(!request_is_empty(Some("/test")));
    }
}
