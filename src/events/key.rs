use std::time::Duration;

use crate::status::Status;

/// A parsed subscription name.
///
/// Names of the form `online:<ms>` or `away:<ms>` are timed keys that fire while the user has
/// been in that status for at least `<ms>` milliseconds. Everything else, including a bare
/// `online` or `away`, is an ordinary event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKey<'a> {
    Plain(&'a str),
    Timed { status: Status, threshold: Duration },
}

impl<'a> EventKey<'a> {
    pub fn parse(name: &'a str) -> Self {
        Self::parse_timed(name)
            .map(|(status, threshold)| EventKey::Timed { status, threshold })
            .unwrap_or(EventKey::Plain(name))
    }

    fn parse_timed(name: &str) -> Option<(Status, Duration)> {
        let (status, millis) = name.split_once(':')?;
        let status = match status {
            "online" => Status::Online,
            "away" => Status::Away,
            _ => return None,
        };
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Values beyond u64 can't be a threshold, so they stay plain names.
        let millis = millis.parse::<u64>().ok()?;
        Some((status, Duration::from_millis(millis)))
    }
}
