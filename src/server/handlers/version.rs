use axum::response::Json;
use serde::Serialize;

/// Build information; the build metadata is injected at compile time when available.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub version: &'static str,
    #[serde(rename = "buildTime")]
    pub build_time: &'static str,
    #[serde(rename = "buildRustVersion")]
    pub build_rust_version: &'static str,
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_time: option_env!("C4STAGE_BUILD_TIME").unwrap_or("unknown"),
        build_rust_version: option_env!("C4STAGE_BUILD_RUST_VERSION").unwrap_or("unknown"),
    }
}

pub async fn get_version() -> Json<VersionInfo> {
    Json(version_info())
}
