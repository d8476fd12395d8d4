/// Background jobs
pub mod watcher;

pub use watcher::RefreshWatcher;
