use std::sync::Mutex;

/// Screens the front end can show; only the login entry point matters to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    Login,
    #[default]
    Dashboard,
    ChatAnalyzer,
    SelfMonitor,
    Support,
}

/// Front-end navigation as seen by the request pipeline.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> Route;

    /// Moves to the login entry point. Returns `false` without navigating when
    /// already there, so repeated rejections cannot loop.
    fn redirect_to_login(&self) -> bool;
}

/// Navigator that only records where the front end is and has been.
#[derive(Debug, Default)]
pub struct RouteTracker {
    inner: Mutex<RouteHistory>,
}

#[derive(Debug, Default)]
struct RouteHistory {
    current: Route,
    redirects: usize,
}

impl RouteTracker {
    pub fn new(start: Route) -> Self {
        Self {
            inner: Mutex::new(RouteHistory {
                current: start,
                redirects: 0,
            }),
        }
    }

    pub fn navigate(&self, route: Route) {
        self.lock().current = route;
    }

    /// Number of forced redirects to the login entry point so far.
    pub fn login_redirects(&self) -> usize {
        self.lock().redirects
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RouteHistory> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RouteTracker {
    fn current_route(&self) -> Route {
        self.lock().current
    }

    fn redirect_to_login(&self) -> bool {
        let mut history = self.lock();
        if history.current == Route::Login {
            return false;
        }
        history.current = Route::Login;
        history.redirects += 1;
        true
    }
}
