//! Downstream payload types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user's profile as returned by the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub preferences: Vec<String>,
    /// Set only on the substitute profile served while the profile service is degraded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl UserProfile {
    /// The profile served when the real one is unavailable.
    pub fn default_fallback() -> Self {
        Self {
            user_id: "default".to_string(),
            preferences: vec!["Comedy".to_string(), "Family".to_string()],
            fallback: true,
        }
    }
}

/// A movie entry from the content or trending service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_id: u64,
    pub title: String,
    pub genre: String,
}

/// Mock service behaviors that can be switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Normal,
    Slow,
    Fail,
}

/// A behavior name other than `normal`, `slow` or `fail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown behavior '{0}'")]
pub struct UnknownBehavior(pub String);

impl std::str::FromStr for Behavior {
    type Err = UnknownBehavior;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Behavior::Normal),
            "slow" => Ok(Behavior::Slow),
            "fail" => Ok(Behavior::Fail),
            other => Err(UnknownBehavior(other.to_string())),
        }
    }
}

/// Failure of a downstream call.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Connection, transport or body decoding failure.
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("unknown downstream service '{0}'")]
    UnknownService(String),
}

pub type DownstreamResult<T> = Result<T, DownstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_wire_format() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"userId":"42","preferences":["Action","Sci-Fi"]}"#).unwrap();
        assert_eq!(profile.user_id, "42");
        assert!(!profile.fallback);

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("fallback").is_none());

        let json = serde_json::to_value(UserProfile::default_fallback()).unwrap();
        assert_eq!(json["userId"], "default");
        assert_eq!(json["fallback"], true);
        assert_eq!(json["preferences"], serde_json::json!(["Comedy", "Family"]));
    }

    #[test]
    fn test_movie_wire_format() {
        let movie: Movie =
            serde_json::from_str(r#"{"movieId":101,"title":"Inception","genre":"Sci-Fi"}"#).unwrap();
        assert_eq!(movie.movie_id, 101);
        assert_eq!(serde_json::to_value(&movie).unwrap()["movieId"], 101);
    }

    #[test]
    fn test_behavior_parse() {
        assert_eq!("slow".parse::<Behavior>().unwrap(), Behavior::Slow);
        assert_eq!(
            "sideways".parse::<Behavior>(),
            Err(UnknownBehavior("sideways".to_string()))
        );
    }
}
