//! Script leaves of a tap tree.

use std::fmt;

use bitcoin::{consensus, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{TAPROOT_ANNEX_PREFIX, TAPSCRIPT_LEAF_VERSION},
    errors::LeafVersionError,
    hashes::{LeafHash, TaggedHasher, TAP_LEAF_TAG},
};

/// The version of a tap leaf.
///
/// The low bit of the first control block byte carries the output key parity, so only even
/// versions can be expressed. `0x50` is excluded because it is the annex prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LeafVersion(u8);

impl LeafVersion {
    /// BIP342 tapscript.
    pub const TAPSCRIPT: Self = Self(TAPSCRIPT_LEAF_VERSION);

    /// Creates a leaf version from its consensus byte.
    pub const fn from_consensus(version: u8) -> Result<Self, LeafVersionError> {
        if version & 1 != 0 {
            return Err(LeafVersionError::Odd(version));
        }

        if version == TAPROOT_ANNEX_PREFIX {
            return Err(LeafVersionError::AnnexPrefix);
        }

        Ok(Self(version))
    }

    /// Returns the consensus byte.
    pub const fn to_consensus(self) -> u8 {
        self.0
    }
}

impl Default for LeafVersion {
    fn default() -> Self {
        Self::TAPSCRIPT
    }
}

impl TryFrom<u8> for LeafVersion {
    type Error = LeafVersionError;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        Self::from_consensus(version)
    }
}

impl From<LeafVersion> for u8 {
    fn from(version: LeafVersion) -> Self {
        version.to_consensus()
    }
}

impl fmt::Display for LeafVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// A single script committed to in a tap tree.
///
/// Leaves are immutable once created; the hash is recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptLeaf {
    /// The leaf version, tapscript unless stated otherwise.
    #[serde(default)]
    leaf_version: LeafVersion,

    /// The leaf script.
    script: ScriptBuf,
}

impl ScriptLeaf {
    /// Creates a tapscript leaf.
    pub fn new(script: ScriptBuf) -> Self {
        Self::with_version(script, LeafVersion::TAPSCRIPT)
    }

    /// Creates a leaf with an explicit version.
    pub const fn with_version(script: ScriptBuf, leaf_version: LeafVersion) -> Self {
        Self {
            leaf_version,
            script,
        }
    }

    /// Returns the leaf version.
    pub const fn leaf_version(&self) -> LeafVersion {
        self.leaf_version
    }

    /// Returns the leaf script.
    pub fn script(&self) -> &ScriptBuf {
        &self.script
    }

    /// Consumes the leaf and returns its script.
    pub fn into_script(self) -> ScriptBuf {
        self.script
    }

    /// Computes `TaggedHash("TapLeaf", leaf_version || compact_size(script) || script)`.
    pub fn leaf_hash(&self) -> LeafHash {
        let mut hasher = TaggedHasher::new(TAP_LEAF_TAG);
        hasher.update([self.leaf_version.to_consensus()]);
        // consensus encoding of a script carries the compact size prefix
        hasher.update(consensus::serialize(&self.script));

        LeafHash::from_byte_array(hasher.finalize())
    }
}

impl From<ScriptBuf> for ScriptLeaf {
    fn from(script: ScriptBuf) -> Self {
        Self::new(script)
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        hashes::Hash,
        taproot::{self, TapLeafHash},
    };

    use super::*;

    #[test]
    fn leaf_version_validation() {
        assert_eq!(LeafVersion::from_consensus(0xc0), Ok(LeafVersion::TAPSCRIPT));
        assert_eq!(
            LeafVersion::from_consensus(0xc1),
            Err(LeafVersionError::Odd(0xc1))
        );
        assert_eq!(
            LeafVersion::from_consensus(0x50),
            Err(LeafVersionError::AnnexPrefix)
        );
        assert!(LeafVersion::from_consensus(0x66).is_ok());
    }

    #[test]
    fn leaf_hash_matches_bitcoin() {
        let scripts = [
            ScriptBuf::new(),
            ScriptBuf::from_hex("51").expect("valid hex"),
            ScriptBuf::from_hex(
                "203455139bf238a3067bd72ed77e0ab8db590330f55ed58dba7366b53bf4734279ac",
            )
            .expect("valid hex"),
            // long enough to need a multi-byte compact size
            ScriptBuf::from_bytes(vec![0x61; 300]),
        ];

        for script in scripts {
            let expected =
                TapLeafHash::from_script(&script, taproot::LeafVersion::TapScript).to_byte_array();
            let leaf = ScriptLeaf::new(script);

            assert_eq!(leaf.leaf_hash().to_byte_array(), expected);
        }
    }

    #[test]
    fn version_changes_leaf_hash() {
        let script = ScriptBuf::from_hex("51").expect("valid hex");
        let other = LeafVersion::from_consensus(0xc2).expect("even version");

        assert_ne!(
            ScriptLeaf::new(script.clone()).leaf_hash(),
            ScriptLeaf::with_version(script, other).leaf_hash()
        );
    }

    #[test]
    fn leaf_from_toml() {
        let leaf: ScriptLeaf = toml::from_str(r#"script = "51""#).expect("must parse leaf");
        assert_eq!(leaf.leaf_version(), LeafVersion::TAPSCRIPT);
        assert_eq!(leaf.script().as_bytes(), &[0x51]);

        let odd = toml::from_str::<ScriptLeaf>(
            r#"
            script = "51"
            leaf_version = 193
            "#,
        );
        assert!(odd.is_err());
    }
}
