use clap::Args;

/// Server settings, taken from flags or `C4STAGE_*` environment variables.
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[clap(short, long, env = "C4STAGE_PORT", default_value = "8080")]
    pub port: u16,

    /// Deployment environment; `production` hides error details
    #[clap(long, env = "C4STAGE_ENV", default_value = "dev")]
    pub env: String,

    #[clap(long, env = "C4STAGE_PLANTUML_SERVER", default_value = "http://localhost:9090")]
    pub plantuml_server: String,

    #[clap(long, env = "C4STAGE_BACKSTAGE_SERVER", default_value = "http://localhost:7007")]
    pub backstage_server: String,

    /// Seconds to wait before the startup import, -1 disables it
    #[clap(
        long,
        env = "C4STAGE_BACKSTAGE_IMPORT_DELAY",
        default_value = "5",
        allow_negative_numbers = true
    )]
    pub backstage_import_delay: i64,

    #[clap(long, env = "C4STAGE_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            env: "dev".to_string(),
            plantuml_server: "http://localhost:9090".to_string(),
            backstage_server: "http://localhost:7007".to_string(),
            backstage_import_delay: 5,
            cors_origin: None,
        }
    }
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env.to_lowercase() == "production"
    }

    /// Delay of the startup import, or `None` when disabled.
    pub fn import_delay(&self) -> Option<std::time::Duration> {
        u64::try_from(self.backstage_import_delay)
            .ok()
            .map(std::time::Duration::from_secs)
    }
}
