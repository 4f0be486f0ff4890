use serde::{Deserialize, Serialize};

/// Display status of a highlighted number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Verified,
    Unverified,
    ManuallyVerified,
}

impl Status {
    /// Manual check overrides auto-verification, which overrides unverified
    pub fn resolve(auto_verified: bool, manually_checked: bool) -> Self {
        if manually_checked {
            Status::ManuallyVerified
        } else if auto_verified {
            Status::Verified
        } else {
            Status::Unverified
        }
    }

    /// CSS class applied to markers
    pub fn css_class(&self) -> &'static str {
        match self {
            Status::Verified => "vo-verified",
            Status::Unverified => "vo-unverified",
            Status::ManuallyVerified => "vo-manual",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Verified => "Verified",
            Status::Unverified => "Unverified",
            Status::ManuallyVerified => "Manually verified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(Status::resolve(false, false), Status::Unverified);
        assert_eq!(Status::resolve(true, false), Status::Verified);
        assert_eq!(Status::resolve(false, true), Status::ManuallyVerified);
        assert_eq!(Status::resolve(true, true), Status::ManuallyVerified);
    }

    #[test]
    fn test_css_classes_distinct() {
        let classes = [
            Status::Verified.css_class(),
            Status::Unverified.css_class(),
            Status::ManuallyVerified.css_class(),
        ];
        assert_ne!(classes[0], classes[1]);
        assert_ne!(classes[1], classes[2]);
        assert_ne!(classes[0], classes[2]);
    }
}
