//! Screen routing for the front-end paths.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Sessions,
    /// Public registration form for the named session.
    Event(String),
}

impl Route {
    /// Maps a path such as `/event/summit_2025` to its screen. Unknown paths land on login.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["sessions"] => Route::Sessions,
            ["event", name] => Route::Event((*name).to_string()),
            _ => Route::Login,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Sessions)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str("/login"),
            Route::Sessions => f.write_str("/sessions"),
            Route::Event(name) => write!(f, "/event/{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Route::Login);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/sessions/"), Route::Sessions);
        assert_eq!(
            Route::parse("/event/summit_2025"),
            Route::Event("summit_2025".into())
        );
        assert_eq!(Route::parse("/event/"), Route::Login);
    }

    #[test]
    fn display_round_trips_event_route() {
        let route = Route::Event("kubecon".into());
        assert_eq!(Route::parse(&route.to_string()), route);
        assert!(!route.requires_auth());
        assert!(Route::Sessions.requires_auth());
    }
}
