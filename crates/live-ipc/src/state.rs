//! Live session state and error vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The state of a live session as seen by consumers.
///
/// Ordinals are stable and used on the wire: 0 = Ready through 5 = Retrying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiveState {
    /// No session exists, or the session has not begun connecting.
    #[default]
    Ready,

    /// Connecting to the ingest endpoint.
    Pending,

    /// Publishing.
    Started,

    /// Publishing ended.
    Stopped,

    /// Publishing failed.
    Failed,

    /// Reconnecting after a dropped connection.
    Retrying,
}

impl LiveState {
    /// All states in ordinal order.
    pub const ALL: [LiveState; 6] = [
        Self::Ready,
        Self::Pending,
        Self::Started,
        Self::Stopped,
        Self::Failed,
        Self::Retrying,
    ];

    /// Returns the stable ordinal of this state.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Ready => 0,
            Self::Pending => 1,
            Self::Started => 2,
            Self::Stopped => 3,
            Self::Failed => 4,
            Self::Retrying => 5,
        }
    }

    /// Maps an ordinal back to a state. Out-of-range values yield `None`.
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Ready),
            1 => Some(Self::Pending),
            2 => Some(Self::Started),
            3 => Some(Self::Stopped),
            4 => Some(Self::Failed),
            5 => Some(Self::Retrying),
            _ => None,
        }
    }

    /// Returns true once a start attempt has resolved one way or the other.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Started | Self::Stopped | Self::Failed)
    }

    /// Returns the display name for this state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Pending => "Pending",
            Self::Started => "Started",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
            Self::Retrying => "Retrying",
        }
    }
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by a live session.
///
/// These are delivered to observers as values; they never change the
/// stored [`LiveState`] on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum LiveError {
    #[error("Unknown")]
    Unknown,

    #[error("Failure obtaining streaming information")]
    StreamingInfoFailure,

    #[error("Connection failure")]
    ConnectionFailure,

    #[error("Verification failure")]
    VerificationFailure,

    #[error("Server timeout")]
    Timeout,
}

impl LiveError {
    /// Returns the stable numeric code for this error.
    pub fn code(self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::StreamingInfoFailure => 202,
            Self::ConnectionFailure => 203,
            Self::VerificationFailure => 204,
            Self::Timeout => 205,
        }
    }

    /// Human-readable description.
    pub fn description(self) -> String {
        self.to_string()
    }
}

/// Host-level network reachability as reported by a reachability monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReachabilityStatus {
    /// No reachability callback has fired yet.
    #[default]
    Unknown,

    /// The host cannot be reached.
    NotReachable,

    /// Reachable over a local network interface.
    ReachableViaEthernetOrWiFi,

    /// Reachable over a cellular interface.
    ReachableViaWwan,
}

impl ReachabilityStatus {
    /// Every status except `NotReachable` counts as reachable, including
    /// `Unknown` before the first update arrives.
    pub fn is_reachable(self) -> bool {
        self != Self::NotReachable
    }
}
