use crate::common::ListenerCapabilities;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How the adapter adopts a new client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptStrategy {
    /// Ask the listener whether a client is waiting; if so evict the current
    /// client, adopt the new one and greet it
    PollAndReplace,
    /// Ask the listener for a waiting socket; if one is handed over evict the
    /// current client and adopt it silently
    TakeIfWaiting,
}

impl AcceptStrategy {
    /// Picks the strategy a listener with these capabilities supports
    pub fn for_capabilities(capabilities: ListenerCapabilities) -> Self {
        if capabilities.can_query_pending {
            AcceptStrategy::PollAndReplace
        } else {
            AcceptStrategy::TakeIfWaiting
        }
    }

    /// Resolves a requested strategy against what the listener can do
    pub fn resolve(requested: Option<Self>, capabilities: ListenerCapabilities) -> Self {
        match requested {
            None => Self::for_capabilities(capabilities),
            Some(AcceptStrategy::PollAndReplace) if !capabilities.can_query_pending => {
                warn!("Listener cannot report pending clients, falling back to take-if-waiting");
                AcceptStrategy::TakeIfWaiting
            }
            Some(strategy) => strategy,
        }
    }

    /// Whether newly adopted clients receive the greeting
    pub fn greets(self) -> bool {
        matches!(self, AcceptStrategy::PollAndReplace)
    }
}

impl fmt::Display for AcceptStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptStrategy::PollAndReplace => write!(f, "poll-and-replace"),
            AcceptStrategy::TakeIfWaiting => write!(f, "take-if-waiting"),
        }
    }
}

impl FromStr for AcceptStrategy {
    type Err = crate::NetDebugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poll-and-replace" => Ok(AcceptStrategy::PollAndReplace),
            "take-if-waiting" => Ok(AcceptStrategy::TakeIfWaiting),
            other => Err(crate::NetDebugError::Config(format!(
                "Unknown accept strategy: {other}"
            ))),
        }
    }
}
