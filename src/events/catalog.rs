//! Well-known event types and sources exchanged between the file watcher,
//! the test executor and the consumers (metrics collector, dashboard).

/// Event type names.
pub mod kind {
    pub const TEST_STARTED: &str = "test.started";
    pub const TEST_COMPLETED: &str = "test.completed";
    pub const TEST_FAILED: &str = "test.failed";
    pub const TEST_SKIPPED: &str = "test.skipped";

    pub const PACKAGE_STARTED: &str = "package.started";
    pub const PACKAGE_COMPLETED: &str = "package.completed";
    pub const PACKAGE_FAILED: &str = "package.failed";

    pub const FILE_CHANGED: &str = "file.changed";
    pub const WATCH_STARTED: &str = "watch.started";
    pub const WATCH_STOPPED: &str = "watch.stopped";
    pub const WATCH_MODE_CHANGED: &str = "watch.mode_changed";

    pub const APP_STARTED: &str = "app.started";
    pub const APP_STOPPED: &str = "app.stopped";
    pub const APP_ERROR: &str = "app.error";
    pub const APP_SHUTDOWN: &str = "app.shutdown";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_CHANGED: &str = "config.changed";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const CACHE_HIT: &str = "cache.hit";
    pub const CACHE_MISS: &str = "cache.miss";
    pub const CACHE_STORE: &str = "cache.store";
    pub const CACHE_CLEAR: &str = "cache.clear";
}

/// Event source names.
pub mod source {
    pub const TEST_RUNNER: &str = "test.runner";
    pub const TEST_PROCESSOR: &str = "test.processor";
    pub const FILE_WATCHER: &str = "file.watcher";
    pub const APP_CONTROLLER: &str = "app.controller";
    pub const CACHE_MANAGER: &str = "cache.manager";
    pub const DISPLAY_RENDERER: &str = "display.renderer";

    pub const FILESYSTEM: &str = "filesystem";
    pub const OPERATING_SYSTEM: &str = "os";
    pub const USER_INPUT: &str = "user";
    pub const CONFIG: &str = "config";
}
