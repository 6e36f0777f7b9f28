//! Terminal page host
//!
//! Keeps a browser-like history and scroll position in memory and prints
//! each action, for driving the controller from `link-voice run`.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{PageHost, page_name};

/// Height used for "scroll to bottom"
const PAGE_HEIGHT: i32 = 4_000;

#[derive(Debug)]
struct Browser {
    history: Vec<String>,
    position: usize,
    scroll: i32,
    reloads: u32,
}

impl Browser {
    fn current(&self) -> &str {
        self.history.get(self.position).map_or("/", String::as_str)
    }
}

/// In-memory page host shared between the controller and the terminal loop
#[derive(Debug, Clone)]
pub struct ConsolePageHost {
    inner: Arc<Mutex<Browser>>,
}

impl ConsolePageHost {
    /// Create a host showing `route`
    #[must_use]
    pub fn new(route: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Browser {
                history: vec![route.to_string()],
                position: 0,
                scroll: 0,
                reloads: 0,
            })),
        }
    }

    /// Current vertical scroll offset
    #[must_use]
    pub fn scroll_position(&self) -> i32 {
        self.browser().scroll
    }

    /// Number of reloads so far
    #[must_use]
    pub fn reloads(&self) -> u32 {
        self.browser().reloads
    }

    fn browser(&self) -> MutexGuard<'_, Browser> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PageHost for ConsolePageHost {
    fn navigate(&mut self, route: &str) {
        let mut browser = self.browser();
        let next = browser.position + 1;
        browser.history.truncate(next);
        browser.history.push(route.to_string());
        browser.position = next;
        browser.scroll = 0;
        println!("📄 {route} ({})", page_name(route));
    }

    fn history_back(&mut self) {
        let mut browser = self.browser();
        if browser.position == 0 {
            tracing::debug!("no history to go back to");
            return;
        }
        browser.position -= 1;
        browser.scroll = 0;
        println!("📄 ← {}", browser.current());
    }

    fn history_forward(&mut self) {
        let mut browser = self.browser();
        if browser.position + 1 >= browser.history.len() {
            tracing::debug!("no history to go forward to");
            return;
        }
        browser.position += 1;
        browser.scroll = 0;
        println!("📄 → {}", browser.current());
    }

    fn scroll_by(&mut self, dy: i32) {
        let mut browser = self.browser();
        browser.scroll = (browser.scroll + dy).clamp(0, PAGE_HEIGHT);
        println!("↕ {}", browser.scroll);
    }

    fn scroll_to_top(&mut self) {
        self.browser().scroll = 0;
        println!("↕ top");
    }

    fn scroll_to_bottom(&mut self) {
        self.browser().scroll = PAGE_HEIGHT;
        println!("↕ bottom");
    }

    fn reload(&mut self) {
        let mut browser = self.browser();
        browser.reloads += 1;
        browser.scroll = 0;
        println!("⟳ {}", browser.current());
    }

    fn current_route(&self) -> String {
        self.browser().current().to_string()
    }
}
