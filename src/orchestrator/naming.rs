// Deterministic resource naming.

pub const CONTAINER_PREFIX: &str = "mc_";
pub const VOLUME_PREFIX: &str = "mc_data_";
pub const LATEST: &str = "latest";

/// Container name for a server id.
pub fn container_name(id: &str) -> String {
    format!("{}{}", CONTAINER_PREFIX, id)
}

/// Named data volume for a server id.
pub fn volume_name(id: &str) -> String {
    format!("{}{}", VOLUME_PREFIX, id)
}

/// Image reference for a version: the bare base for "latest", `base:version` otherwise.
pub fn image_reference(base: &str, version: &str) -> String {
    if version == LATEST {
        base.to_string()
    } else {
        format!("{}:{}", base, version)
    }
}

/// Tag passed to a pull. `None` lets the registry pick its default.
pub fn pull_tag(version: &str) -> Option<&str> {
    if version == LATEST {
        None
    } else {
        Some(version)
    }
}
