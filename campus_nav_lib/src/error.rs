use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Location permission denied or no location source available.
    LocationUnavailable(String),
    /// The directions provider returned a non-OK status or a malformed route.
    Routing(String),
    /// The destination lookup failed.
    Resolver(String),
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::LocationUnavailable(msg) => write!(f, "Location unavailable: {msg}"),
            NavigationError::Routing(msg) => write!(f, "Could not calculate route: {msg}"),
            NavigationError::Resolver(msg) => write!(f, "Could not load class info: {msg}"),
        }
    }
}

impl std::error::Error for NavigationError {}
