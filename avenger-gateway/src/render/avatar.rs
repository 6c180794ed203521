use std::io::Cursor;

use image::ImageFormat;
use image::imageops::FilterType;

use super::RenderError;

/// Avatar edge length on the rank card, in pixels.
pub const AVATAR_SIZE: u32 = 180;

/// Download an avatar image.
pub async fn fetch_avatar(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, RenderError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}

/// Decode an avatar in any supported format and re-encode it as a square
/// `AVATAR_SIZE` PNG.
pub fn normalize_avatar(raw: &[u8]) -> Result<Vec<u8>, RenderError> {
    let resized = image::load_from_memory(raw)?.resize_exact(
        AVATAR_SIZE,
        AVATAR_SIZE,
        FilterType::Lanczos3,
    );
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
