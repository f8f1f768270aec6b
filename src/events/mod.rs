//! Change propagation: the change bus and the media watcher.

mod bus;
mod watcher;

pub use bus::{ChangeBus, SubscriberId};
pub use watcher::MediaWatcher;
