use crate::types::AssetKey;
use blake3::Hasher;
use std::fmt;
use std::path::Path;

/// Stable asset identifier (content-addressed by key, not by runtime pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AssetId(pub(crate) u128);

impl AssetId {
    #[inline]
    pub fn to_u128(self) -> u128 {
        self.0
    }

    #[inline]
    pub fn from_key(key: &AssetKey) -> Self {
        Self::from_path(&key.logical_path)
    }

    pub fn from_path(p: &Path) -> Self {
        let mut h = Hasher::new();
        hash_path(&mut h, p);
        let out = h.finalize();
        let bytes = out.as_bytes();
        let mut lo = [0u8; 16];
        lo.copy_from_slice(&bytes[0..16]);
        Self(u128::from_le_bytes(lo))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[inline]
fn hash_path(h: &mut Hasher, p: &Path) {
    // Same logical asset regardless of separator style or casing.
    let s = p.to_string_lossy().replace('\\', "/").to_ascii_lowercase();
    h.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ignores_case_and_separators() {
        let a = AssetKey::new("Views/MainMenu.view.json").id();
        let b = AssetKey::new("views\\mainmenu.view.json").id();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_paths_get_distinct_ids() {
        let a = AssetKey::new("views/a.json").id();
        let b = AssetKey::new("views/b.json").id();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }
}
