use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use super::{
    AVATAR_SIZE, BG_COLOR, BLURPLE, FONT_FAMILY, PANEL_COLOR, RenderError, TEXT_COLOR,
    normalize_avatar, rasterize, truncate_chars, xml_escape,
};

const WIDTH: u32 = 934;
const HEIGHT: u32 = 282;
const PANEL_INSET: u32 = 10;
const AVATAR_X: u32 = 50;
const AVATAR_Y: u32 = 51;
const TEXT_X: u32 = 280;
const TITLE_MAX_CHARS: usize = 26;
const TAGLINE_MAX_CHARS: usize = 56;

/// Everything drawn on a rank card.
#[derive(Debug, Clone)]
pub struct RankCard {
    /// Card heading, e.g. "Event Avenger rank card"
    pub title: String,
    pub display_name: String,
    pub balance: i64,
    pub position: usize,
    pub ledger_size: usize,
    pub tagline: String,
    /// Raw avatar image in any supported format
    pub avatar: Option<Vec<u8>>,
}

/// Render a 934x282 rank card.
///
/// An avatar that fails to decode is replaced by a plain blurple circle.
pub fn render_rank_card_png(card: &RankCard) -> Result<Vec<u8>, RenderError> {
    let avatar_png = card.avatar.as_deref().and_then(|raw| {
        normalize_avatar(raw)
            .map_err(|e| warn!("Avatar for {} unusable: {}", card.display_name, e))
            .ok()
    });
    rasterize(&build_svg(card, avatar_png.as_deref()))
}

fn build_svg(card: &RankCard, avatar_png: Option<&[u8]>) -> String {
    let mut s = String::with_capacity(4096 + avatar_png.map_or(0, |png| png.len() * 4 / 3));
    let _ = write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#,
    );

    let radius = AVATAR_SIZE / 2;
    let cx = AVATAR_X + radius;
    let cy = AVATAR_Y + radius;
    let _ = write!(
        s,
        r#"<defs><clipPath id="avatar-clip"><circle cx="{cx}" cy="{cy}" r="{radius}"/></clipPath></defs>"#,
    );

    let _ = write!(
        s,
        r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="{BG_COLOR}"/>"#
    );
    let panel_w = WIDTH - 2 * PANEL_INSET;
    let panel_h = HEIGHT - 2 * PANEL_INSET;
    let _ = write!(
        s,
        r#"<rect x="{PANEL_INSET}" y="{PANEL_INSET}" width="{panel_w}" height="{panel_h}" fill="{PANEL_COLOR}"/>"#,
    );

    match avatar_png {
        Some(png) => {
            let data = STANDARD.encode(png);
            let _ = write!(
                s,
                r#"<image x="{AVATAR_X}" y="{AVATAR_Y}" width="{AVATAR_SIZE}" height="{AVATAR_SIZE}" clip-path="url(#avatar-clip)" xlink:href="data:image/png;base64,{data}"/>"#,
            );
        }
        None => {
            let _ = write!(
                s,
                r#"<circle cx="{cx}" cy="{cy}" r="{radius}" fill="{BLURPLE}"/>"#
            );
        }
    }

    let title = xml_escape(&truncate_chars(&card.title, TITLE_MAX_CHARS));
    let _ = write!(
        s,
        r#"<text x="{TEXT_X}" y="80" font-family="{FONT_FAMILY}" font-size="40" font-weight="700" fill="{TEXT_COLOR}">{title}</text>"#,
    );
    let _ = write!(
        s,
        r#"<text x="{TEXT_X}" y="150" font-family="{FONT_FAMILY}" font-size="32" fill="{TEXT_COLOR}">Points: {}</text>"#,
        card.balance,
    );
    let _ = write!(
        s,
        r#"<text x="{TEXT_X}" y="200" font-family="{FONT_FAMILY}" font-size="32" fill="{TEXT_COLOR}">Rank: #{} of {}</text>"#,
        card.position, card.ledger_size,
    );
    let tagline = xml_escape(&truncate_chars(&card.tagline, TAGLINE_MAX_CHARS));
    let _ = write!(
        s,
        r#"<text x="{TEXT_X}" y="245" font-family="{FONT_FAMILY}" font-size="18" fill="{BLURPLE}">{tagline}</text>"#,
    );

    s.push_str("</svg>");
    s
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn card(avatar: Option<Vec<u8>>) -> RankCard {
        RankCard {
            title: "Event Avenger rank card".to_string(),
            display_name: "Alice".to_string(),
            balance: 42,
            position: 2,
            ledger_size: 7,
            tagline: "Make your friends join Event Avengers too for fun competition!"
                .to_string(),
            avatar,
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn card_text() {
        let svg = build_svg(&card(None), None);
        assert!(svg.contains(">Points: 42<"));
        assert!(svg.contains(">Rank: #2 of 7<"));
        assert!(svg.contains("Event Avenger rank card"));
        assert!(svg.contains(r#"width="934" height="282""#));
    }

    #[test]
    fn missing_avatar_draws_placeholder_circle() {
        let svg = build_svg(&card(None), None);
        assert!(svg.contains(&format!(r#"r="90" fill="{BLURPLE}""#)));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn renders_with_avatar() {
        let png = render_rank_card_png(&card(Some(tiny_png()))).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn garbage_avatar_still_renders() {
        let png = render_rank_card_png(&card(Some(b"not an image".to_vec()))).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
