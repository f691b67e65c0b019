use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Identity and time recorded on a revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

impl Signature {
    /// Name stamped on every revision written by the engine.
    pub const SYSTEM_NAME: &'static str = "gitdb";
    /// Email stamped on every revision written by the engine.
    pub const SYSTEM_EMAIL: &'static str = "gitdb@github.com";

    pub fn new(name: impl Into<String>, email: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            // Sub-millisecond precision does not survive every serializer.
            when: when.trunc_subsecs(3),
        }
    }

    /// The fixed system identity at the current wall-clock time.
    pub fn system_now() -> Self {
        Self::new(Self::SYSTEM_NAME, Self::SYSTEM_EMAIL, Utc::now())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn system_identity() {
        let sig = Signature::system_now();
        assert_eq!(sig.name, "gitdb");
        assert_eq!(sig.email, "gitdb@github.com");
        // After 2020-01-01.
        assert!(sig.when.timestamp() > 1_577_836_800);
    }

    #[test]
    fn truncates_to_milliseconds() {
        let when = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let sig = Signature::new("a", "b", when);
        assert_eq!(sig.when.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn display_format() {
        let when = Utc.timestamp_opt(0, 0).unwrap();
        let sig = Signature::new("gitdb", "gitdb@github.com", when);
        assert_eq!(
            sig.to_string(),
            "gitdb <gitdb@github.com> 1970-01-01T00:00:00+00:00"
        );
    }
}
