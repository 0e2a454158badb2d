use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;

use lcl_attest::LocalSigner;
use lcl_crypto::{AddressDeriver, SigningKey};
use lcl_types::{Address, CatalogId};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Signer service configuration, usually loaded from TOML.
///
/// ```toml
/// bind_addr = "0.0.0.0:8080"
/// program_id = "…base58…"
///
/// [[catalogs]]
/// name = "main"
/// id = 0
/// signer_secret = "…64 hex chars…"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerServiceConfig {
    pub bind_addr: SocketAddr,
    /// Base58 program id; the built-in default when absent.
    pub program_id: Option<String>,
    pub catalogs: Vec<CatalogSecret>,
}

/// A catalog served by this signer and its hex-encoded signing secret.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogSecret {
    pub name: String,
    pub id: u64,
    pub signer_secret: String,
}

impl Default for SignerServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            program_id: None,
            catalogs: Vec::new(),
        }
    }
}

impl SignerServiceConfig {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn deriver(&self) -> ServerResult<AddressDeriver> {
        match &self.program_id {
            None => Ok(AddressDeriver::default()),
            Some(text) => Address::from_bs58(text)
                .map(AddressDeriver::new)
                .map_err(|e| ServerError::Config(format!("program_id: {e}"))),
        }
    }

    /// Build the signer holding every configured catalog key.
    pub fn signer(&self) -> ServerResult<LocalSigner> {
        let mut signer = LocalSigner::new(self.deriver()?);
        let mut names = BTreeSet::new();
        for catalog in &self.catalogs {
            if !names.insert(catalog.name.as_str()) {
                return Err(ServerError::Config(format!("catalog {:?} configured twice", catalog.name)));
            }
            let key = SigningKey::from_hex(&catalog.signer_secret)
                .map_err(|e| ServerError::Config(format!("catalog {:?}: {e}", catalog.name)))?;
            signer.add_catalog(catalog.name.as_str(), CatalogId(catalog.id), key);
        }
        Ok(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml(secret: &str) -> String {
        format!(
            r#"
bind_addr = "0.0.0.0:9000"

[[catalogs]]
name = "main"
id = 4
signer_secret = "{secret}"
"#
        )
    }

    #[test]
    fn default_config() {
        let c = SignerServiceConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(c.catalogs.is_empty());
        assert_eq!(c.deriver().unwrap(), AddressDeriver::default());
    }

    #[test]
    fn loads_from_file() {
        let key = SigningKey::generate();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_toml(&key.to_hex()).as_bytes()).unwrap();

        let config = SignerServiceConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        let signer = config.signer().unwrap();
        let catalogs: Vec<_> = signer.catalogs().collect();
        assert_eq!(catalogs, vec![("main", CatalogId(4), key.verifying_key())]);
    }

    #[test]
    fn bad_secret_is_config_error() {
        let config = SignerServiceConfig::from_toml(&sample_toml("zz")).unwrap();
        assert!(matches!(config.signer(), Err(ServerError::Config(_))));
    }

    #[test]
    fn duplicate_catalog_names_rejected() {
        let secret = SigningKey::generate().to_hex();
        let mut config = SignerServiceConfig::from_toml(&sample_toml(&secret)).unwrap();
        config.catalogs.push(config.catalogs[0].clone());
        assert!(matches!(config.signer(), Err(ServerError::Config(_))));
    }

    #[test]
    fn custom_program_id() {
        let program = Address::new([7; 32]);
        let config = SignerServiceConfig {
            program_id: Some(program.to_bs58()),
            ..Default::default()
        };
        assert_eq!(config.deriver().unwrap().program_id(), &program);

        let bad = SignerServiceConfig {
            program_id: Some("not base58 0OIl".into()),
            ..Default::default()
        };
        assert!(bad.deriver().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SignerServiceConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
