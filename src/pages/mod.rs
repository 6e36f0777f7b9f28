//! Page host integration
//!
//! The page host is whatever renders the application: it owns routing,
//! history, and scrolling. Built-in commands drive it; the controller learns
//! about route changes either from [`crate::VoiceController::route_changed`]
//! or by reading [`PageHost::current_route`] after a command runs.

pub mod console;

/// Known routes and their spoken names
pub const ROUTES: &[(&str, &str)] = &[
    ("/", "Home Page"),
    ("/chat", "Chat Assistant"),
    ("/deaf", "Deaf Learning Section"),
    ("/blind", "Blind Accessibility Section"),
    ("/tools", "AI Tools"),
    ("/about", "About Page"),
    ("/settings", "Settings"),
];

/// Spoken name for a route not in [`ROUTES`]
pub const UNKNOWN_PAGE: &str = "Unknown Page";

/// Spoken name of a route
#[must_use]
pub fn page_name(route: &str) -> &'static str {
    ROUTES
        .iter()
        .find(|(path, _)| *path == route)
        .map_or(UNKNOWN_PAGE, |(_, name)| *name)
}

/// Announcement made after arriving on a page in blind mode
#[must_use]
pub fn navigation_announcement(page: &str) -> String {
    format!(
        "Navigated to {page}. Say \"help\" or \"what can I do\" to hear available commands on this page."
    )
}

/// Answer to "where am i"
#[must_use]
pub fn location_announcement(page: &str) -> String {
    format!("You are currently on the {page}.")
}

/// The UI surface built-in commands act on
pub trait PageHost: Send {
    /// Navigate to a route
    fn navigate(&mut self, route: &str);

    /// Go back in history
    fn history_back(&mut self);

    /// Go forward in history
    fn history_forward(&mut self);

    /// Scroll vertically by `dy` pixels
    fn scroll_by(&mut self, dy: i32);

    /// Scroll to the top of the page
    fn scroll_to_top(&mut self);

    /// Scroll to the bottom of the page
    fn scroll_to_bottom(&mut self);

    /// Reload the current page
    fn reload(&mut self);

    /// Route currently showing
    fn current_route(&self) -> String;
}
