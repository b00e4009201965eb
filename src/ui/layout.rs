use crate::config::ThemeConfig;

pub const HEADER_HEIGHT: f32 = 36.0;
pub const STATUS_HEIGHT: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl CardRect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// Card grid geometry for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub card_width: f32,
    pub card_height: f32,
    pub grid_top: f32,
    pub visible_rows: usize,
    pub first_row: usize,
    padding: f32,
    spacing: f32,
    total: usize,
}

impl GridLayout {
    pub fn compute(theme: &ThemeConfig, width: f32, height: f32, total: usize, selected: usize) -> Self {
        let columns = theme.columns.max(1);
        let spacing = theme.spacing.max(0.0);
        let card_height = theme.card_height.max(1.0);
        let inner_width = (width - 2.0 * theme.padding).max(0.0);
        let card_width = ((inner_width - (columns - 1) as f32 * spacing) / columns as f32).max(0.0);

        let grid_top = theme.padding + HEADER_HEIGHT + spacing;
        let grid_bottom = height - theme.padding - STATUS_HEIGHT;
        let row_height = card_height + spacing;
        let total_rows = total.div_ceil(columns);
        let visible_rows = ((grid_bottom - grid_top + spacing) / row_height).floor().max(1.0) as usize;
        let visible_rows = visible_rows.min(total_rows.max(1));

        let selected_row = selected / columns;
        // Keep the selected row roughly centered once the grid overflows.
        let first_row = if total_rows <= visible_rows || selected_row < visible_rows / 2 {
            0
        } else {
            (selected_row - visible_rows / 2).min(total_rows - visible_rows)
        };

        Self {
            columns,
            card_width,
            card_height,
            grid_top,
            visible_rows,
            first_row,
            padding: theme.padding,
            spacing,
            total,
        }
    }

    /// Positions in the filtered view that are on screen.
    pub fn visible(&self) -> std::ops::Range<usize> {
        let start = self.first_row.saturating_mul(self.columns).min(self.total);
        let end = self
            .first_row
            .saturating_add(self.visible_rows)
            .saturating_mul(self.columns)
            .min(self.total);
        start..end
    }

    pub fn card_rect(&self, position: usize) -> Option<CardRect> {
        if !self.visible().contains(&position) {
            return None;
        }
        let row = position / self.columns - self.first_row;
        let col = position % self.columns;
        Some(CardRect {
            x: self.padding + col as f32 * (self.card_width + self.spacing),
            y: self.grid_top + row as f32 * (self.card_height + self.spacing),
            w: self.card_width,
            h: self.card_height,
        })
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.visible()
            .find(|&pos| self.card_rect(pos).is_some_and(|r| r.contains(x, y)))
    }
}

/// Shortens `text` to at most `max_chars` characters, ending in an ellipsis when cut.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> ThemeConfig {
        ThemeConfig {
            columns: 3,
            card_height: 100.0,
            padding: 20.0,
            spacing: 10.0,
            ..ThemeConfig::default()
        }
    }

    #[test]
    fn test_grid_columns_and_card_width() {
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 12, 0);
        assert_eq!(layout.columns, 3);
        assert!((layout.card_width - 580.0 / 3.0).abs() < 1e-3);
        assert_eq!(layout.grid_top, 20.0 + HEADER_HEIGHT + 10.0);
    }

    #[test]
    fn test_visible_rows_and_scrolling() {
        // grid_top = 66, bottom = 600 - 20 - 18 = 562 -> (562 - 66 + 10) / 110 = 4.6
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 20, 0);
        assert_eq!(layout.visible_rows, 4);
        assert_eq!(layout.first_row, 0);
        assert_eq!(layout.visible(), 0..12);

        // 20 entries -> 7 rows; selecting the last one scrolls to the end
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 20, 19);
        assert_eq!(layout.first_row, 3);
        assert_eq!(layout.visible(), 9..20);

        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 20, 10);
        assert_eq!(layout.first_row, 1);
    }

    #[test]
    fn test_zero_row_height_does_not_overflow() {
        let theme = ThemeConfig {
            columns: 3,
            card_height: 0.0,
            spacing: 0.0,
            padding: 24.0,
            ..ThemeConfig::default()
        };
        let layout = GridLayout::compute(&theme, 640.0, 600.0, 12, 11);
        assert!(layout.visible_rows <= 4);
        assert_eq!(layout.visible().end, 12);
        assert!(layout.card_rect(11).is_some());

        let negative = ThemeConfig { card_height: -50.0, ..theme };
        let layout = GridLayout::compute(&negative, 640.0, 600.0, 12, 0);
        assert_eq!(layout.card_height, 1.0);
        assert_eq!(layout.visible(), 0..12);
    }

    #[test]
    fn test_small_grid_never_scrolls() {
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 5, 4);
        assert_eq!(layout.first_row, 0);
        assert_eq!(layout.visible(), 0..5);
        assert!(layout.card_rect(5).is_none());
    }

    #[test]
    fn test_hit_test() {
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 12, 0);
        let second = layout.card_rect(1).unwrap();
        assert_eq!(layout.hit_test(second.x + 1.0, second.y + 1.0), Some(1));
        let fourth = layout.card_rect(3).unwrap();
        assert_eq!(fourth.x, 20.0);
        assert_eq!(layout.hit_test(fourth.x + 5.0, fourth.y + 50.0), Some(3));
        // Gutter between cards and the header are not cards.
        assert_eq!(layout.hit_test(second.x - 5.0, second.y + 1.0), None);
        assert_eq!(layout.hit_test(30.0, 10.0), None);
    }

    #[test]
    fn test_empty_view() {
        let layout = GridLayout::compute(&theme(), 640.0, 600.0, 0, 0);
        assert_eq!(layout.visible(), 0..0);
        assert_eq!(layout.hit_test(100.0, 100.0), None);
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("exactly10!", 10), "exactly10!");
        assert_eq!(ellipsize("mcp start api --docs", 10), "mcp start…");
        assert_eq!(ellipsize("äöüäöü", 4), "äöü…");
        assert_eq!(ellipsize("abc", 0), "");
    }
}
