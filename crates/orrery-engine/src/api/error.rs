use thiserror::Error;

use crate::api::types::BodyId;

/// Errors raised by scene setup, configuration, and asset loading.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A required host element was not found.
    #[error("element #{0} not found")]
    MissingElement(String),

    /// A body name outside the registry was passed to a strict lookup.
    #[error("unknown body '{0}'")]
    UnknownBody(String),

    /// The host could not retrieve an asset.
    #[error("failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    /// Retrieved bytes are not a usable GLB model.
    #[error("failed to decode {path}: {source}")]
    Glb {
        path: String,
        #[source]
        source: GlbError,
    },

    /// Manifest or configuration JSON failed to parse.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A manifest entry asks for a scale that would collapse or mirror the model.
    #[error("invalid scale {scale} for {body}")]
    InvalidScale { body: BodyId, scale: f64 },
}

/// Failures while decoding a binary glTF container.
#[derive(Debug, Error)]
pub enum GlbError {
    #[error("file too short ({0} bytes)")]
    Truncated(usize),

    #[error("bad magic 0x{0:08x}")]
    BadMagic(u32),

    #[error("unsupported glTF version {0}")]
    UnsupportedVersion(u32),

    #[error("first chunk is not JSON")]
    MissingJson,

    #[error("chunk overruns file at offset {0}")]
    ChunkOverrun(usize),

    #[error("invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("buffer {0} has no data (external URIs are not supported)")]
    MissingBuffer(usize),

    #[error("{kind} index {index} out of range")]
    BadIndex { kind: &'static str, index: usize },

    #[error("accessor {0} has unsupported layout")]
    UnsupportedAccessor(usize),

    #[error("primitive mode {0} is not triangles")]
    UnsupportedMode(u32),

    #[error("accessor {0} reads past the end of its buffer view")]
    AccessorOverrun(usize),

    #[error("buffer view {0} reads past the end of the BIN chunk")]
    ViewOverrun(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = SceneError::MissingElement("scene-container".into());
        assert_eq!(err.to_string(), "element #scene-container not found");

        let err = SceneError::Glb {
            path: "public/earth.glb".into(),
            source: GlbError::BadMagic(0xdeadbeef),
        };
        assert_eq!(err.to_string(), "failed to decode public/earth.glb: bad magic 0xdeadbeef");
    }

    #[test]
    fn json_errors_convert_into_manifest_errors() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SceneError = json_err.into();
        assert!(matches!(err, SceneError::Manifest(_)));
    }
}
