// Images from the create form, normalized from file parts and pasted data URLs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("{0} is not an image")]
    NotAnImage(String),

    #[error("Pasted image could not be read")]
    BadDataUrl,

    #[error("{0} is empty")]
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// A multipart file part. The content type falls back to a guess from the name.
    pub fn from_file(filename: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        let content_type = content_type
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        if extension_for(&content_type).is_none() {
            return Err(ImageError::NotAnImage(filename.to_string()));
        }
        if bytes.is_empty() {
            return Err(ImageError::Empty(filename.to_string()));
        }

        Ok(Self {
            filename: filename.to_string(),
            content_type,
            bytes,
        })
    }

    /// A `data:image/...;base64,...` URL produced by a clipboard paste or a
    /// preview carried through a re-rendered form.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageError> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or(ImageError::BadDataUrl)?;
        let (meta, payload) = rest.split_once(',').ok_or(ImageError::BadDataUrl)?;
        let content_type = meta
            .strip_suffix(";base64")
            .ok_or(ImageError::BadDataUrl)?;
        let ext = extension_for(content_type)
            .ok_or_else(|| ImageError::NotAnImage("pasted content".into()))?;

        let bytes = STANDARD.decode(payload).map_err(|_| ImageError::BadDataUrl)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty("pasted image".into()));
        }

        Ok(Self {
            filename: format!("paste_{}.{}", Utc::now().timestamp_millis(), ext),
            content_type: content_type.to_string(),
            bytes,
        })
    }

    /// Inline form of the image for re-rendering the form after a validation error.
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    /// A fresh storage key: `<millis>_<random base36>.<ext>`.
    pub fn object_key(&self) -> String {
        format!(
            "{}_{}.{}",
            Utc::now().timestamp_millis(),
            random_base36(9),
            self.extension()
        )
    }

    /// Taken from the validated content type, never from the client's file name.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type).unwrap_or("img")
    }
}

/// Accepted upload types. No SVG.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Keys are single path segments of `[A-Za-z0-9._-]`, never starting with a dot.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
