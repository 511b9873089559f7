use std::error::Error;
use std::fmt;

/// Engine-wide error.
///
/// Keep this small and stable. Services may define their own error types and map them into `EngineError`.
/// None of these are fatal: callers log them and keep the loop running.
#[derive(Debug)]
pub enum EngineError {
    /// Graceful shutdown was requested.
    ExitRequested,

    /// Lookup of a service, state, view or asset that is not registered.
    NotFound { kind: RegistryKind, name: String },

    /// Second registration under an existing key. The first entry stays.
    AlreadyExists { kind: RegistryKind, name: String },

    /// Loaded asset does not carry the expected component.
    MissingComponent { asset: String, component: String },

    /// Error produced by a service during a known lifecycle stage.
    Service {
        service: &'static str,
        stage: ServiceStage,
        cause: Box<EngineError>,
    },

    /// Generic error (fallback).
    Other(String),
}

/// Registry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Service,
    State,
    View,
    Asset,
    Label,
}

impl RegistryKind {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            RegistryKind::Service => "service",
            RegistryKind::State => "state",
            RegistryKind::View => "view",
            RegistryKind::Asset => "asset",
            RegistryKind::Label => "label",
        }
    }
}

/// Service lifecycle stage used for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStage {
    Init,
    LateInit,
    Update,
    Cleanup,
}

impl EngineError {
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    #[inline]
    pub fn not_found(kind: RegistryKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    #[inline]
    pub fn already_exists(kind: RegistryKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    #[inline]
    pub fn missing_component(asset: impl Into<String>, component: impl Into<String>) -> Self {
        Self::MissingComponent {
            asset: asset.into(),
            component: component.into(),
        }
    }

    #[inline]
    pub fn with_stage(service: &'static str, stage: ServiceStage, err: EngineError) -> Self {
        match err {
            EngineError::ExitRequested => EngineError::ExitRequested,
            other => EngineError::Service {
                service,
                stage,
                cause: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping stage attribution.
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::Service { cause, .. } => cause.root(),
            other => other,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), EngineError::NotFound { .. })
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ExitRequested => write!(f, "exit requested"),
            EngineError::NotFound { kind, name } => {
                write!(f, "{} '{name}' is not registered", kind.as_str())
            }
            EngineError::AlreadyExists { kind, name } => {
                write!(f, "{} '{name}' is already registered", kind.as_str())
            }
            EngineError::MissingComponent { asset, component } => {
                write!(f, "{asset} does not have a {component} component")
            }
            EngineError::Other(s) => write!(f, "{s}"),
            EngineError::Service {
                service,
                stage,
                cause,
            } => write!(f, "service '{service}' stage {stage:?}: {cause}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::Service { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<&str> for EngineError {
    #[inline]
    fn from(value: &str) -> Self {
        EngineError::Other(value.to_string())
    }
}

impl From<String> for EngineError {
    #[inline]
    fn from(value: String) -> Self {
        EngineError::Other(value)
    }
}

impl From<keystone_assets::AssetError> for EngineError {
    #[inline]
    fn from(value: keystone_assets::AssetError) -> Self {
        EngineError::Other(value.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapping_keeps_exit_requested() {
        let e = EngineError::with_stage("A", ServiceStage::Init, EngineError::ExitRequested);
        assert!(matches!(e, EngineError::ExitRequested));
    }

    #[test]
    fn root_skips_attribution() {
        let e = EngineError::with_stage(
            "ViewService",
            ServiceStage::LateInit,
            EngineError::not_found(RegistryKind::Service, "AssetService"),
        );
        assert!(e.is_not_found());
        assert_eq!(
            e.to_string(),
            "service 'ViewService' stage LateInit: service 'AssetService' is not registered"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn missing_component_names_asset_and_component() {
        let e = EngineError::missing_component("Decor", "View");
        assert_eq!(e.to_string(), "Decor does not have a View component");
        assert!(!e.is_not_found());
    }
}
