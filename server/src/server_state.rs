use campus_nav_tracking::config::NavigatorConfig;

pub struct ServerState {
    pub config: NavigatorConfig,
    // Shared so every session reuses one connection pool.
    pub http: reqwest::Client,
}
