use std::{path::Path, sync::Arc};

use ::tracing::{info, warn};
use anyhow::{anyhow, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;

/// Without inotify the certificate is loaded once and never reloaded.
#[cfg(not(target_os = "linux"))]
pub(crate) async fn create_tls_config_and_watch_certificate_changes(
    tls_config: TlsConfig,
) -> Result<RustlsConfig> {
    let server_config = load_tls_server_config(&tls_config.cert_file, &tls_config.key_file).await?;
    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

/// Return the RustlsConfig used by the HTTPS listener and reload it once both
/// the certificate and the key files have been rewritten.
#[cfg(target_os = "linux")]
pub(crate) async fn create_tls_config_and_watch_certificate_changes(
    tls_config: TlsConfig,
) -> Result<RustlsConfig> {
    use ::tracing::error;
    use tokio_stream::StreamExt;

    let server_config = load_tls_server_config(&tls_config.cert_file, &tls_config.key_file).await?;
    let rustls_config = RustlsConfig::from_config(Arc::new(server_config));
    let reloadable_config = rustls_config.clone();

    let inotify =
        inotify::Inotify::init().map_err(|e| anyhow!("Cannot initialize inotify: {e}"))?;
    let cert_watch = inotify
        .watches()
        .add(&tls_config.cert_file, inotify::WatchMask::CLOSE_WRITE)
        .map_err(|e| anyhow!("Cannot watch certificate file: {e}"))?;
    let key_watch = inotify
        .watches()
        .add(&tls_config.key_file, inotify::WatchMask::CLOSE_WRITE)
        .map_err(|e| anyhow!("Cannot watch key file: {e}"))?;

    let stream = inotify
        .into_event_stream([0u8; 1024])
        .map_err(|e| anyhow!("Cannot create inotify event stream: {e}"))?;

    tokio::spawn(async move {
        tokio::pin!(stream);
        let mut cert_changed = false;
        let mut key_changed = false;

        while let Some(event) = stream.next().await {
            match event {
                Ok(event) if event.wd == cert_watch => {
                    info!("TLS certificate file has been modified");
                    cert_changed = true;
                }
                Ok(event) if event.wd == key_watch => {
                    info!("TLS key file has been modified");
                    key_changed = true;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("Cannot read inotify event: {e}");
                    continue;
                }
            }

            if !(cert_changed && key_changed) {
                continue;
            }
            cert_changed = false;
            key_changed = false;

            match load_tls_server_config(&tls_config.cert_file, &tls_config.key_file).await {
                Ok(server_config) => {
                    info!("Reloading TLS certificate");
                    reloadable_config.reload_from_config(Arc::new(server_config));
                }
                Err(e) => error!("Failed to reload TLS certificate: {e}"),
            }
        }
    });

    Ok(rustls_config)
}

async fn load_tls_server_config(cert_file: &Path, key_file: &Path) -> Result<ServerConfig> {
    let (cert, key) = load_server_cert_and_key(cert_file, key_file).await?;

    Ok(ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert, key)?)
}

async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file)
        .await
        .map_err(|e| anyhow!("Cannot read certificate file {}: {e}", cert_file.display()))?;
    let key_contents = tokio::fs::read(key_file)
        .await
        .map_err(|e| anyhow!("Cannot read key file {}: {e}", key_file.display()))?;

    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(&cert_contents)
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect();
    if certs.is_empty() {
        return Err(anyhow!(
            "No certificate found inside of {}",
            cert_file.display()
        ));
    }

    let key = PrivateKeyDer::from_pem_slice(&key_contents)
        .map_err(|e| anyhow!("Cannot parse private key {}: {e}", key_file.display()))?;

    Ok((certs, key))
}
