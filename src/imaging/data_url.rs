use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::optimizer::OptimizeError;

/// MIME assumed for bare base64 payloads; browser clients always send JPEG.
const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Accepts either `data:<mime>;base64,<payload>` or a bare base64 payload.
pub fn parse_data_url(input: &str) -> Result<DecodedImage, OptimizeError> {
    let input = input.trim();
    let (mime, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| OptimizeError::Read("data url has no payload".into()))?;
            let mut parts = header.split(';');
            let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
            if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
                return Err(OptimizeError::Read("data url is not base64 encoded".into()));
            }
            (mime, payload)
        }
        None => (DEFAULT_MIME.to_string(), input),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| OptimizeError::Read(format!("invalid base64: {e}")))?;
    Ok(DecodedImage { mime, bytes })
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Approximate decoded size of a base64 string, in KB.
pub fn estimate_size_kb(base64: &str) -> f64 {
    (base64.len() as f64 * 3.0) / 4.0 / 1024.0
}
