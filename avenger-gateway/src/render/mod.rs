//! SVG-based image rendering for leaderboards and rank cards.
//!
//! Both images are assembled as SVG strings and rasterized via resvg. The
//! system font database is scanned once; call [`init_fonts`] at startup from
//! a blocking context so the first render does not stall the runtime.

mod avatar;
mod leaderboard;
mod rank_card;

use std::sync::LazyLock;

use resvg::tiny_skia;
use resvg::usvg;

pub use avatar::{AVATAR_SIZE, fetch_avatar, normalize_avatar};
pub use leaderboard::render_leaderboard_png;
pub use rank_card::{RankCard, render_rank_card_png};

// ---------------------------------------------------------------------------
// Discord dark palette
// ---------------------------------------------------------------------------
const BG_COLOR: &str = "#2C2F33";
const PANEL_COLOR: &str = "#36393F";
const ZEBRA_ODD: &str = "#2F3136";
const BLURPLE: &str = "#7289DA";
const GOLD: &str = "#FFD700";
const TEXT_COLOR: &str = "#FFFFFF";

const FONT_FAMILY: &str = "'DejaVu Sans', 'Inter', 'Segoe UI', 'Helvetica Neue', 'Arial', 'Noto Sans', sans-serif";

static SVG_OPTIONS: LazyLock<usvg::Options> = LazyLock::new(|| {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt
});

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("SVG parse: {0}")]
    Svg(String),

    #[error("pixmap allocation failed ({width}x{height})")]
    Pixmap { width: u32, height: u32 },

    #[error("PNG encode: {0}")]
    Encode(String),

    #[error("avatar download: {0}")]
    AvatarFetch(#[from] reqwest::Error),

    #[error("avatar decode: {0}")]
    AvatarDecode(#[from] image::ImageError),
}

/// Eagerly initialize the system font database.
pub fn init_fonts() {
    let fonts = LazyLock::force(&SVG_OPTIONS).fontdb.len();
    tracing::debug!("Loaded {} system font faces", fonts);
}

fn rasterize(svg: &str) -> Result<Vec<u8>, RenderError> {
    let tree = usvg::Tree::from_data(svg.as_bytes(), &SVG_OPTIONS)
        .map_err(|e| RenderError::Svg(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(RenderError::Pixmap {
            width: size.width(),
            height: size.height(),
        })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Shorten `s` to at most `max_chars` characters, ending with an ellipsis.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
