use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Token, User};

/// The persisted user/token pair.
///
/// `expires_at` is an absolute instant, stored as epoch milliseconds. Once it
/// has passed the record counts as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: User,
    pub token: Token,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthData {
    /// Build auth data expiring `expires_in_secs` from now.
    ///
    /// A lifetime of zero, or one too large to represent, means no expiry.
    pub fn new(user: User, token: Token, expires_in_secs: Option<u64>) -> Self {
        let expires_at = expires_in_secs
            .filter(|secs| *secs > 0)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        Self {
            user,
            token,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }

    /// Seconds remaining until expiry, clamped at zero. `None` if it never expires.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|at| (at - Utc::now()).num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthData {
        AuthData::new(User::new(1, "Ana", "ana@example.com"), Token::bearer("t"), None)
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let data = sample();
        assert!(data.expires_at.is_none());
        assert!(!data.is_expired());
        assert!(data.seconds_until_expiry().is_none());
    }

    #[test]
    fn test_zero_lifetime_means_no_expiry() {
        let data = AuthData::new(User::new(1, "Ana", "a@x"), Token::bearer("t"), Some(0));
        assert!(data.expires_at.is_none());
    }

    #[test]
    fn test_expiry_in_future_and_past() {
        let data = AuthData::new(User::new(1, "Ana", "a@x"), Token::bearer("t"), Some(3600));
        assert!(!data.is_expired());
        assert!(data.seconds_until_expiry().unwrap() > 3500);

        let later = Utc::now() + Duration::hours(2);
        assert!(data.is_expired_at(later));
    }

    #[test]
    fn test_expires_at_serializes_as_epoch_millis() {
        let mut data = sample();
        data.expires_at = DateTime::from_timestamp_millis(1_700_000_000_123);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["expiresAt"], 1_700_000_000_123i64);

        let back: AuthData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_missing_expires_at_parses_as_none() {
        let json = r#"{"user": {"id": 1, "email": "a@x", "name": "A"}, "token": {"token": "t"}}"#;
        let data: AuthData = serde_json::from_str(json).unwrap();
        assert!(data.expires_at.is_none());
    }
}
