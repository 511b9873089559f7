use crate::types::{AssetError, AssetKey, LoadedAsset, RequestId};

#[derive(Debug, Clone)]
pub enum AssetEvent {
    Ready {
        request: RequestId,
        asset: LoadedAsset,
    },
    Failed {
        request: RequestId,
        key: AssetKey,
        error: AssetError,
    },
    BatchReady {
        request: RequestId,
        label: String,
        assets: Vec<LoadedAsset>,
    },
    BatchFailed {
        request: RequestId,
        label: String,
        error: AssetError,
    },
}

impl AssetEvent {
    #[inline]
    pub fn request(&self) -> RequestId {
        match self {
            AssetEvent::Ready { request, .. }
            | AssetEvent::Failed { request, .. }
            | AssetEvent::BatchReady { request, .. }
            | AssetEvent::BatchFailed { request, .. } => *request,
        }
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, AssetEvent::Failed { .. } | AssetEvent::BatchFailed { .. })
    }
}
