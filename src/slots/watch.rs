//! Watch directive resolution

use std::fmt;
use std::str::FromStr;

/// What an edit should do to the actor's watch of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchDirective {
    /// Add the page to the watchlist
    Watch,
    /// Remove the page from the watchlist
    Unwatch,
    /// Follow the actor's stored preferences
    Preferences,
    /// Keep the current watch state
    #[default]
    NoChange,
}

impl FromStr for WatchDirective {
    type Err = std::convert::Infallible;

    /// Unrecognised values, including the empty string, mean `NoChange`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "watch" => WatchDirective::Watch,
            "unwatch" => WatchDirective::Unwatch,
            "preferences" => WatchDirective::Preferences,
            _ => WatchDirective::NoChange,
        })
    }
}

impl fmt::Display for WatchDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchDirective::Watch => "watch",
            WatchDirective::Unwatch => "unwatch",
            WatchDirective::Preferences => "preferences",
            WatchDirective::NoChange => "nochange",
        };
        f.write_str(s)
    }
}

/// Facts about the actor and page that a directive is resolved against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchContext {
    pub currently_watching: bool,
    pub automated_agent: bool,
    pub watch_default: bool,
    pub watch_on_create: bool,
    /// The edit created the page
    pub page_created: bool,
}

/// Resolve a directive into the watch state to apply
pub fn resolve_watch(directive: WatchDirective, ctx: &WatchContext) -> bool {
    match directive {
        WatchDirective::Watch => true,
        WatchDirective::Unwatch => false,
        WatchDirective::Preferences => {
            if ctx.currently_watching {
                return true;
            }
            // Bots would otherwise collect enormous watchlists
            if ctx.automated_agent {
                return ctx.currently_watching;
            }
            ctx.watch_default || (ctx.watch_on_create && ctx.page_created)
        }
        WatchDirective::NoChange => ctx.currently_watching,
    }
}
