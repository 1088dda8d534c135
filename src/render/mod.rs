//! Deterministic SVG rendering of a board.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use svg::node::element::{Circle, Rectangle, Text};
use svg::Document;
use tracing::instrument;

use crate::error::ConfigError;
use crate::game::{Board, Cell, COLS, ROWS};

/// MIME type of the rendered image.
pub const CONTENT_TYPE: &str = "image/svg+xml";

/// Smallest accepted cell size in pixels.
pub const MIN_SQUARE_SIZE: u32 = 10;

/// Largest accepted cell size in pixels.
pub const MAX_SQUARE_SIZE: u32 = 1_000;

/// Image geometry and palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Side of one cell in pixels.
    pub square_size: u32,
    pub board_color: String,
    pub player_one_color: String,
    pub player_two_color: String,
    pub empty_color: String,
    pub text_color: String,
    pub marker_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            square_size: 80,
            board_color: "#1161ea".into(),
            player_one_color: "#ffe042".into(),
            player_two_color: "#fe1614".into(),
            empty_color: "#ffffff".into(),
            text_color: "#000000".into(),
            marker_color: "#000000".into(),
        }
    }
}

impl RenderConfig {
    /// Width of the image: one square per column.
    pub fn width(&self) -> u32 {
        self.square_size.saturating_mul(COLS as u32)
    }

    /// Height of the image: one square per row plus the footer.
    pub fn height(&self) -> u32 {
        self.square_size.saturating_mul(ROWS as u32 + 1)
    }

    /// Reject sizes outside `MIN_SQUARE_SIZE..=MAX_SQUARE_SIZE` and colors
    /// that are not `#rrggbb` literals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SQUARE_SIZE..=MAX_SQUARE_SIZE).contains(&self.square_size) {
            return Err(ConfigError::Validation(format!(
                "render.square_size must be between {MIN_SQUARE_SIZE} and {MAX_SQUARE_SIZE}, got {}",
                self.square_size
            )));
        }
        for (name, color) in self.colors() {
            if !is_hex_color(color) {
                return Err(ConfigError::Validation(format!(
                    "render.{name} must be a #rrggbb color, got {color:?}"
                )));
            }
        }
        Ok(())
    }

    fn margin(&self) -> u32 {
        self.square_size / 10
    }

    fn radius(&self) -> u32 {
        self.square_size / 2 - self.margin()
    }

    fn cell_color(&self, cell: Cell) -> &str {
        match cell {
            Cell::Empty => &self.empty_color,
            Cell::One => &self.player_one_color,
            Cell::Two => &self.player_two_color,
        }
    }

    fn colors(&self) -> [(&'static str, &str); 6] {
        [
            ("board_color", &self.board_color),
            ("player_one_color", &self.player_one_color),
            ("player_two_color", &self.player_two_color),
            ("empty_color", &self.empty_color),
            ("text_color", &self.text_color),
            ("marker_color", &self.marker_color),
        ]
    }
}

/// Whether `color` is a `#rrggbb` literal.
fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Render `board` with the default palette. `last_move` is the 1-based
/// column of the latest move; its top piece gets a marker.
pub fn encode_board<W: Write>(writer: W, board: &Board, last_move: Option<i32>) -> io::Result<W> {
    encode_board_with(writer, board, last_move, &RenderConfig::default())
}

/// Render `board` with `config`. An invalid config fails with
/// `ErrorKind::InvalidInput` before anything is written.
#[instrument(skip(writer, board, config))]
pub fn encode_board_with<W: Write>(
    mut writer: W,
    board: &Board,
    last_move: Option<i32>,
    config: &RenderConfig,
) -> io::Result<W> {
    config
        .validate()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let size = config.square_size;
    let half = size / 2;
    let radius = config.radius();
    let marked_col = last_move
        .and_then(|column| column.checked_sub(1))
        .and_then(|col| usize::try_from(col).ok());

    let mut document = Document::new()
        .set("width", config.width())
        .set("height", config.height())
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", config.width())
                .set("height", config.height())
                .set("style", format!("fill: {}", config.board_color)),
        );

    let text_style = format!(
        "dominant-baseline:middle;text-anchor:middle;fill:{};font-size: {}px",
        config.text_color,
        size - config.margin()
    );

    for col in 0..COLS {
        let cx = col as u32 * size + half;
        let mut highlighted = false;
        for row in 0..ROWS {
            let cy = row as u32 * size + half;
            let cell = board.get(row, col);
            document = document.add(circle(cx, cy, radius, config.cell_color(cell)));

            if !highlighted && cell != Cell::Empty && marked_col == Some(col) {
                document = document.add(circle(cx, cy, radius / 2, &config.marker_color));
                highlighted = true;
            }
        }
        document = document.add(
            Text::new((col + 1).to_string())
                .set("x", cx)
                .set("y", ROWS as u32 * size + half)
                .set("style", text_style.as_str()),
        );
    }

    svg::write(&mut writer, &document)?;
    writer.flush()?;
    Ok(writer)
}

fn circle(cx: u32, cy: u32, r: u32, color: &str) -> Circle {
    Circle::new()
        .set("cx", cx)
        .set("cy", cy)
        .set("r", r)
        .set("style", format!("fill: {color}"))
}

/// Render into a fresh buffer.
pub fn board_svg(board: &Board, last_move: Option<i32>, config: &RenderConfig) -> io::Result<Vec<u8>> {
    encode_board_with(Vec::new(), board, last_move, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    fn render(board: &Board, last_move: Option<i32>) -> String {
        String::from_utf8(encode_board(Vec::new(), board, last_move).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_board_layout() {
        let svg = render(&Board::new(), None);
        assert!(svg.starts_with(r#"<svg height="560" width="560" xmlns="http://www.w3.org/2000/svg">"#));
        assert!(svg.contains(r#"<rect height="560" style="fill: #1161ea" width="560" x="0" y="0"/>"#));
        assert_eq!(svg.matches("<circle").count(), ROWS * COLS);
        assert_eq!(svg.matches("fill: #ffffff").count(), ROWS * COLS);
        for col in 1..=COLS {
            assert!(svg.contains(&format!(">\n{col}\n</text>")));
        }
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_cell_geometry() {
        let svg = render(&Board::new(), None);
        // First column, top row: centre (40, 40), radius 40 - 8
        assert!(svg.contains(r#"<circle cx="40" cy="40" r="32" style="fill: #ffffff"/>"#));
        // Last column, bottom row
        assert!(svg.contains(r#"<circle cx="520" cy="440" r="32" style="fill: #ffffff"/>"#));
        // Footer label for column 7
        assert!(svg.contains(
            r#"<text style="dominant-baseline:middle;text-anchor:middle;fill:#000000;font-size: 72px" x="520" y="520">"#
        ));
    }

    #[test]
    fn test_pieces_are_colored() {
        let mut board = Board::new();
        board.play(1, Player::One).unwrap();
        board.play(2, Player::Two).unwrap();
        let svg = render(&board, None);

        assert!(svg.contains(r#"<circle cx="40" cy="440" r="32" style="fill: #ffe042"/>"#));
        assert!(svg.contains(r#"<circle cx="120" cy="440" r="32" style="fill: #fe1614"/>"#));
        assert!(!svg.contains(r#"r="16""#));
    }

    #[test]
    fn test_marker_on_topmost_piece_of_last_column() {
        let mut board = Board::new();
        board.play(3, Player::One).unwrap();
        board.play(3, Player::Two).unwrap();
        let svg = render(&board, Some(3));

        assert_eq!(svg.matches(r#"r="16""#).count(), 1);
        assert!(svg.contains(r#"<circle cx="200" cy="360" r="16" style="fill: #000000"/>"#));
    }

    #[test]
    fn test_marker_skipped_for_empty_or_invalid_column() {
        let mut board = Board::new();
        board.play(3, Player::One).unwrap();
        assert_eq!(render(&board, Some(5)).matches(r#"r="16""#).count(), 0);
        assert_eq!(render(&board, Some(0)).matches(r#"r="16""#).count(), 0);
        assert_eq!(render(&board, Some(-2)).matches(r#"r="16""#).count(), 0);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut board = Board::new();
        for column in [4, 4, 3, 5, 2] {
            let seat = if board.piece_count() % 2 == 0 {
                Player::One
            } else {
                Player::Two
            };
            board.play(column, seat).unwrap();
        }
        let first = encode_board(Vec::new(), &board, Some(2)).unwrap();
        let second = encode_board(Vec::new(), &board, Some(2)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_palette() {
        let config = RenderConfig {
            square_size: 40,
            board_color: "#000080".into(),
            ..RenderConfig::default()
        };
        let svg = String::from_utf8(board_svg(&Board::new(), None, &config).unwrap()).unwrap();
        assert!(svg.starts_with(r#"<svg height="280" width="280""#));
        assert!(svg.contains("fill: #000080"));
        assert!(svg.contains(r#"r="16""#));
    }

    #[test]
    fn test_oversized_squares_are_rejected() {
        let config = RenderConfig {
            square_size: u32::MAX / 2,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.width(), u32::MAX);

        let err = board_svg(&Board::new(), None, &config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_markup_in_color_is_rejected() {
        let config = RenderConfig {
            board_color: r#"red" /><script>alert(1)</script><rect style=""#.into(),
            ..RenderConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("render.board_color"));

        let mut sink = Vec::new();
        let err = encode_board_with(&mut sink, &Board::new(), None, &config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_label_text_is_escaped() {
        let doc = Document::new().add(Text::new("<b>&</b>").set("style", r#"a"b"#));
        let out = doc.to_string();
        assert!(out.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert!(out.contains(r#"style="a&quot;b""#));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#1161ea"));
        assert!(is_hex_color("#FFFFFF"));
        assert!(!is_hex_color("1161ea"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#12345g"));
        assert!(!is_hex_color("red\" onload=\"x"));
    }
}
