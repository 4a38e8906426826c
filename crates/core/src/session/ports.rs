//! Port interface for client-side navigation

/// Moves the application to another route
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
