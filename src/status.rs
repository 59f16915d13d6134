//! The online/away state and the model that holds it.

use std::{fmt::Display, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Status {
    Online,
    Away,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Away => "away",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(Status::Online),
            "away" => Ok(Status::Away),
            other => Err(PresenceError::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Status {
    type Error = PresenceError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Status {
    type Error = PresenceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Current status together with the moment the user last came online.
///
/// `last_online_at` is `Some` exactly while the status is [Status::Online].
#[derive(Debug, Clone, PartialEq)]
pub struct StatusModel {
    current_status: Status,
    last_online_at: Option<DateTime<Utc>>,
}

impl StatusModel {
    pub fn new(initial_status: Status, now: DateTime<Utc>) -> Self {
        let mut model = Self {
            current_status: initial_status,
            last_online_at: None,
        };
        model.set_status(initial_status, now);
        model
    }

    /// The only way to change the status. Raw values are validated into a [Status] before they
    /// get here, so this can't fail.
    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        self.current_status = status;
        self.last_online_at = match status {
            Status::Online => Some(now),
            Status::Away => None,
        };
    }

    pub fn current_status(&self) -> Status {
        self.current_status
    }

    pub fn last_online_at(&self) -> Option<DateTime<Utc>> {
        self.last_online_at
    }

    /// How long the user has been continuously online. Clock skew backwards counts as zero.
    pub fn online_for(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_online_at
            .map(|since| (now - since).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::error::PresenceError;

    use super::{Status, StatusModel};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    #[test]
    fn set_status_tracks_last_online() {
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let mut model = StatusModel::new(Status::Away, start);
        assert_eq!(model.last_online_at(), None);

        for (offset, status) in [(1, Status::Online), (2, Status::Away), (3, Status::Online)] {
            let now = start + chrono::Duration::seconds(offset);
            model.set_status(status, now);
            assert_eq!(model.current_status(), status);
            assert_eq!(model.last_online_at().is_some(), status == Status::Online);
            if status == Status::Online {
                assert_eq!(model.last_online_at(), Some(now));
            }
        }
    }

    #[test]
    fn initial_online_starts_the_online_clock() {
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let model = StatusModel::new(Status::Online, start);
        assert_eq!(model.last_online_at(), Some(start));
        assert_eq!(
            model.online_for(start + chrono::Duration::milliseconds(2500)),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(
            model.online_for(start - chrono::Duration::seconds(1)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn parses_status_names() {
        assert_eq!("online".parse::<Status>().unwrap(), Status::Online);
        assert_eq!(Status::try_from("away").unwrap(), Status::Away);
        assert!(matches!(
            "Online".parse::<Status>(),
            Err(PresenceError::InvalidStatus(s)) if s == "Online"
        ));
        assert!("".parse::<Status>().is_err());
        assert_eq!(Status::Away.to_string(), "away");
    }

    #[test]
    fn status_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Status::Online).unwrap(), "\"online\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"away\"").unwrap(),
            Status::Away
        );
        let err = serde_json::from_str::<Status>("\"busy\"").unwrap_err();
        assert!(err.to_string().contains("Invalid status 'busy'"));
    }
}
