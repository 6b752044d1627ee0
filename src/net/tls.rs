//! TLS configuration and certificate loading.

use std::io::{Error, ErrorKind};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::routing::tenant::TlsMaterial;

/// Load TLS configuration from a tenant's certificate material.
///
/// PEM certificate + key only; PKCS#12 bundles are rejected.
pub async fn load_tls_config(material: &TlsMaterial) -> Result<RustlsConfig, Error> {
    match (&material.cert, &material.key) {
        (Some(cert), Some(key)) => {
            ensure_exists(cert, "Certificate")?;
            ensure_exists(key, "Private key")?;
            RustlsConfig::from_pem_file(cert, key).await
        }
        _ if material.pfx.is_some() => Err(Error::new(
            ErrorKind::Unsupported,
            "PKCS#12 (pfx) bundles are not supported; configure cert and key PEM files",
        )),
        _ => Err(Error::new(
            ErrorKind::InvalidInput,
            "TLS enabled without both a certificate and a private key",
        )),
    }
}

fn ensure_exists(path: &Path, what: &str) -> Result<(), Error> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::NotFound,
            format!("{} file not found: {:?}", what, path),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_files_are_not_found() {
        let material = TlsMaterial {
            cert: Some(PathBuf::from("/nonexistent/cert.pem")),
            key: Some(PathBuf::from("/nonexistent/key.pem")),
            pfx: None,
        };
        let err = load_tls_config(&material).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn pfx_only_is_unsupported() {
        let material = TlsMaterial {
            pfx: Some(PathBuf::from("site.pfx")),
            ..TlsMaterial::default()
        };
        let err = load_tls_config(&material).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn empty_material_is_invalid() {
        let err = load_tls_config(&TlsMaterial::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
