use std::fmt::Write;

use avenger_ledger::LeaderboardEntry;

use super::{
    BG_COLOR, BLURPLE, FONT_FAMILY, GOLD, PANEL_COLOR, RenderError, TEXT_COLOR, ZEBRA_ODD,
    rasterize, truncate_chars, xml_escape,
};

// Render at 2x for crisp output when Discord downscales the preview
const SCALE: f32 = 2.0;

const WIDTH: f32 = 720.0;
const TITLE_HEIGHT: f32 = 72.0;
const ROW_HEIGHT: f32 = 56.0;
const ROW_GAP: f32 = 8.0;
const MARGIN: f32 = 16.0;
const ROW_RADIUS: f32 = 8.0;
const NAME_MAX_CHARS: usize = 28;
const PODIUM: usize = 3;

/// Render ranked leaderboard rows to a PNG.
///
/// Rows are drawn in the order given. Entries ranked #1 to #3 get gold
/// position labels and a blurple border. An empty slice renders a
/// placeholder row.
pub fn render_leaderboard_png(entries: &[LeaderboardEntry]) -> Result<Vec<u8>, RenderError> {
    rasterize(&build_svg(entries))
}

fn build_svg(entries: &[LeaderboardEntry]) -> String {
    let rows = entries.len().max(1) as f32;
    let w = WIDTH;
    let h = (TITLE_HEIGHT + rows * (ROW_HEIGHT + ROW_GAP) + MARGIN).ceil();
    let pw = (w * SCALE).ceil();
    let ph = (h * SCALE).ceil();

    let mut s = String::with_capacity(1024 + entries.len() * 512);
    let _ = write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{pw}" height="{ph}" viewBox="0 0 {w} {h}">"#,
    );
    let _ = write!(s, r#"<rect width="{w}" height="{h}" fill="{BG_COLOR}"/>"#);

    let title_x = w / 2.0;
    let _ = write!(
        s,
        r#"<text x="{title_x}" y="48" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="30" font-weight="700" fill="{TEXT_COLOR}">Leaderboard</text>"#,
    );

    let row_w = w - 2.0 * MARGIN;
    if entries.is_empty() {
        let y = TITLE_HEIGHT;
        let _ = write!(
            s,
            r#"<rect x="{MARGIN}" y="{y}" width="{row_w}" height="{ROW_HEIGHT}" rx="{ROW_RADIUS}" fill="{PANEL_COLOR}"/>"#,
        );
        let baseline = y + ROW_HEIGHT * 0.62;
        let _ = write!(
            s,
            r#"<text x="{title_x}" y="{baseline}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="20" fill="{TEXT_COLOR}">No points yet</text>"#,
        );
    }

    for (i, entry) in entries.iter().enumerate() {
        let y = TITLE_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_GAP);
        let fill = if i % 2 == 0 { PANEL_COLOR } else { ZEBRA_ODD };
        let on_podium = entry.position <= PODIUM;
        let stroke = if on_podium { BLURPLE } else { fill };
        let _ = write!(
            s,
            r#"<rect x="{MARGIN}" y="{y}" width="{row_w}" height="{ROW_HEIGHT}" rx="{ROW_RADIUS}" fill="{fill}" stroke="{stroke}" stroke-width="2"/>"#,
        );

        let baseline = y + ROW_HEIGHT * 0.62;
        let rank_color = if on_podium { GOLD } else { TEXT_COLOR };
        let position_x = MARGIN + 56.0;
        let _ = write!(
            s,
            r#"<text x="{position_x}" y="{baseline}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="22" font-weight="700" fill="{rank_color}">#{}</text>"#,
            entry.position,
        );

        let name_x = MARGIN + 112.0;
        let name = xml_escape(&truncate_chars(&entry.display_name, NAME_MAX_CHARS));
        let _ = write!(
            s,
            r#"<text x="{name_x}" y="{baseline}" font-family="{FONT_FAMILY}" font-size="20" font-weight="700" fill="{TEXT_COLOR}">{name}</text>"#,
        );

        let points_x = w - MARGIN - 20.0;
        let _ = write!(
            s,
            r#"<text x="{points_x}" y="{baseline}" text-anchor="end" font-family="{FONT_FAMILY}" font-size="20" fill="{BLURPLE}">Points: {}</text>"#,
            entry.balance,
        );
    }

    s.push_str("</svg>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, balance: i64, position: usize) -> LeaderboardEntry {
        LeaderboardEntry {
            display_name: name.to_string(),
            balance,
            position,
        }
    }

    #[test]
    fn renders_png() {
        let entries = vec![
            entry("Alice", 50, 1),
            entry("Bob", 20, 2),
            entry("Carol", 10, 3),
            entry("Dave", 5, 5),
        ];
        let png = render_leaderboard_png(&entries).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn empty_board_renders_placeholder() {
        let svg = build_svg(&[]);
        assert!(svg.contains("No points yet"));
        let png = render_leaderboard_png(&[]).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn podium_rows_are_highlighted() {
        let entries: Vec<_> = (1..=4).map(|p| entry("x", 10, p)).collect();
        let svg = build_svg(&entries);
        assert_eq!(svg.matches(&format!(r#"stroke="{BLURPLE}""#)).count(), 3);
        assert_eq!(svg.matches(&format!(r#"fill="{GOLD}""#)).count(), 3);
    }

    #[test]
    fn podium_follows_rank_not_row() {
        // #2 left the guild; #4 is drawn third but is not on the podium
        let entries = vec![entry("a", 30, 1), entry("c", 20, 3), entry("d", 10, 4)];
        let svg = build_svg(&entries);
        assert_eq!(svg.matches(&format!(r#"stroke="{BLURPLE}""#)).count(), 2);
        assert_eq!(svg.matches(&format!(r#"fill="{GOLD}""#)).count(), 2);
        assert!(svg.contains(&format!(r#"fill="{TEXT_COLOR}">#4</text>"#)));
    }

    #[test]
    fn keeps_position_gaps_and_escapes_names() {
        let svg = build_svg(&[entry("<script>", 9, 1), entry("Eve & co", 3, 4)]);
        assert!(svg.contains("#1</text>"));
        assert!(svg.contains("#4</text>"));
        assert!(!svg.contains("#2</text>"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("Eve &amp; co"));
        assert!(svg.contains("Points: 9"));
    }
}
