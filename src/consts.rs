pub mod render {
    pub const TITLE: &str = "Generated Video";
    pub const WIDTH: u32 = 1920;
    pub const HEIGHT: u32 = 1080;
    pub const DURATION_SECS: u32 = 5;
    pub const QUALITY: &str = "1080p";
}

pub mod polling {
    // Renders of a few seconds of video finish in well under two minutes,
    // so a fixed interval costs at most a couple dozen status requests.
    pub const DEFAULT_INTERVAL_SECS: u64 = 5;
    pub const DEFAULT_MAX_WAIT_SECS: u64 = 120;
}

pub mod http {
    /// Per-request limit for API calls. Downloads can run longer.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Longest silence allowed between two reads of a response body.
    pub const READ_TIMEOUT_SECS: u64 = 30;
}
