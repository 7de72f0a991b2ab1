//! Almacén de fotos
//!
//! Las fotos de los contratos se guardan como ficheros bajo el directorio de
//! uploads y se referencian como `/uploads/<fichero>`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

use crate::dto::contract_dto::PhotoUpload;
use crate::models::contract::PhotoRef;
use crate::utils::errors::{AppError, AppResult};

/// Prefijo público de las referencias de fotos
pub const PUBLIC_PREFIX: &str = "/uploads/";

const MAX_FILE_NAME_LEN: usize = 100;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn save(&self, upload: &PhotoUpload) -> AppResult<PhotoRef>;

    /// Borrar una foto. Una foto que ya no existe no es un error.
    async fn delete(&self, photo: &str) -> AppResult<()>;

    /// Borrado best-effort de varias fotos
    async fn delete_all(&self, photos: &[PhotoRef]) {
        for photo in photos {
            if let Err(e) = self.delete(photo).await {
                tracing::warn!("⚠️ No se pudo borrar la foto {}: {}", photo, e);
            }
        }
    }
}

/// Fotos en el sistema de ficheros local
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ruta en disco de una referencia propia; `None` si la referencia no es nuestra
    fn resolve(&self, photo: &str) -> Option<PathBuf> {
        let file = photo.strip_prefix(PUBLIC_PREFIX)?;
        if file.is_empty() || file.contains(['/', '\\']) || file.starts_with('.') {
            return None;
        }
        Some(self.root.join(file))
    }
}

/// Nombre de fichero seguro: sólo la última componente, caracteres ASCII simples
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Decodificar el payload base64, quitando el prefijo `data:<mime>;base64,` si viene
pub fn decode_payload(data: &str) -> AppResult<Vec<u8>> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, encoded)| encoded)
            .ok_or_else(|| AppError::InvalidInput("Malformed data URL".to_string()))?,
        None => data,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::InvalidInput("Photo data is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Photo data is empty".to_string()));
    }
    Ok(bytes)
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn save(&self, upload: &PhotoUpload) -> AppResult<PhotoRef> {
        if let Some(content_type) = &upload.content_type {
            if !content_type.starts_with("image/") {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported content type '{}'",
                    content_type
                )));
            }
        }

        let bytes = decode_payload(&upload.data)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot create {}: {}", self.root.display(), e)))?;

        let short_id = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &short_id[..8],
            sanitize_file_name(&upload.file_name)
        );

        tokio::fs::write(self.root.join(&file_name), &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot write {}: {}", file_name, e)))?;

        tracing::debug!("📷 Foto guardada: {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
    }

    async fn delete(&self, photo: &str) -> AppResult<()> {
        let Some(path) = self.resolve(photo) else {
            tracing::warn!("⚠️ Referencia de foto ignorada: {}", photo);
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Cannot delete {}: {}", photo, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, data: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("contrat signé.jpg"), "contrat_sign_.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..."), "photo");
    }

    #[test]
    fn test_decode_payload_accepts_data_url() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(decode_payload("%%%").is_err());
        assert!(decode_payload("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_delete_photo() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path());

        let photo = store.save(&upload("avant.jpg", "aGVsbG8=")).await.unwrap();
        assert!(photo.starts_with(PUBLIC_PREFIX));
        assert!(photo.ends_with("-avant.jpg"));

        let path = store.resolve(&photo).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        store.delete(&photo).await.unwrap();
        assert!(!path.exists());
        // Borrar dos veces no falla
        store.delete(&photo).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_image_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalPhotoStore::new(dir.path());
        let mut pdf = upload("contrat.pdf", "aGVsbG8=");
        pdf.content_type = Some("application/pdf".to_string());
        assert!(matches!(store.save(&pdf).await, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let store = LocalPhotoStore::new("/tmp/uploads");
        assert!(store.resolve("/uploads/../secret").is_none());
        assert!(store.resolve("/uploads/a/b.jpg").is_none());
        assert!(store.resolve("/elsewhere/a.jpg").is_none());
        assert!(store.resolve("/uploads/ok.jpg").is_some());
    }
}
