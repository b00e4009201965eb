use tiny_skia::{Paint, Color, Rect, Transform, PixmapMut, PixmapPaint, PathBuilder, Stroke};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, SwashCache};
use crate::state::Session;
use crate::ui::icons::IconCache;
use crate::ui::layout::{CardRect, GridLayout, HEADER_HEIGHT, ellipsize};
use crate::config::ThemeConfig;

const ICON_SIZE: u32 = 22;
const NAME_SIZE: f32 = 17.0;
const DESCRIPTION_SIZE: f32 = 13.0;
const COMMAND_SIZE: f32 = 13.0;
const COMMAND_BOX_HEIGHT: f32 = 30.0;
const CARD_INSET: f32 = 14.0;

struct Palette {
    background: Color,
    border: Color,
    title: Color,
    text: Color,
    name: Color,
    muted: Color,
    card: Color,
    command_box: Color,
    selection: Color,
}

impl Palette {
    fn from_theme(theme: &ThemeConfig) -> Self {
        Self {
            background: ThemeConfig::parse_color(&theme.background),
            border: ThemeConfig::parse_color(&theme.border_color),
            title: ThemeConfig::parse_color(&theme.title),
            text: ThemeConfig::parse_color(&theme.text),
            name: ThemeConfig::parse_color(&theme.name),
            muted: ThemeConfig::parse_color(&theme.muted),
            card: ThemeConfig::parse_color(&theme.card_background),
            command_box: ThemeConfig::parse_color(&theme.command_background),
            selection: ThemeConfig::parse_color(&theme.selection_border),
        }
    }
}

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    pub icon_cache: IconCache,
}

impl Renderer {
    pub fn new(icon_cache: IconCache) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            icon_cache,
        }
    }

    pub fn insert_icon(&mut self, name: String, pixmap: Option<tiny_skia::Pixmap>) {
        self.icon_cache.insert(name, pixmap);
    }

    pub fn draw(&mut self, pixmap: &mut PixmapMut, session: &Session, theme: &ThemeConfig) {
        let palette = Palette::from_theme(theme);
        pixmap.fill(Color::TRANSPARENT);

        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) {
            self.draw_rounded_rect(pixmap, rect, theme.border_radius, palette.background, Some(palette.border));
        }

        self.draw_header(pixmap, session, theme, &palette, width);

        let layout = GridLayout::compute(theme, width, height, session.filtered_len(), session.selected_index);
        let visible = layout.visible();
        for (position, entry) in session.filtered().enumerate().skip(visible.start).take(visible.len()) {
            let Some(card) = layout.card_rect(position) else { continue };
            let selected = position == session.selected_index;
            self.draw_card(pixmap, entry, card, selected, theme, &palette);
        }

        if session.filtered_len() == 0 {
            let message = if session.catalog().is_empty() { "No servers in the catalog" } else { "No servers match" };
            self.draw_text(pixmap, message, theme.padding, layout.grid_top, 16.0, palette.muted, false);
        }

        let status = session.status_line();
        let status_y = height - theme.padding - 14.0;
        self.draw_text(pixmap, &status, theme.padding, status_y, 12.0, palette.muted, false);
    }

    fn draw_header(&mut self, pixmap: &mut PixmapMut, session: &Session, theme: &ThemeConfig, palette: &Palette, width: f32) {
        self.draw_text(pixmap, "MCP Registry", theme.padding, theme.padding, 26.0, palette.title, false);

        let field_w = (width / 3.0).max(160.0);
        let field_x = width - theme.padding - field_w;
        if let Some(field) = Rect::from_xywh(field_x, theme.padding, field_w, HEADER_HEIGHT - 4.0) {
            self.draw_rounded_rect(pixmap, field, (HEADER_HEIGHT - 4.0) / 2.0, palette.command_box, Some(palette.border));
        }

        let (text, color) = if session.query().is_empty() {
            ("Search servers...".to_string(), palette.muted)
        } else {
            (format!("{}|", session.query()), palette.text)
        };
        self.draw_text(pixmap, &text, field_x + 14.0, theme.padding + 8.0, 15.0, color, false);
    }

    fn draw_card(&mut self, pixmap: &mut PixmapMut, entry: &crate::model::Entry, card: CardRect, selected: bool, theme: &ThemeConfig, palette: &Palette) {
        let Some(rect) = Rect::from_xywh(card.x, card.y, card.w, card.h) else { return };
        let outline = if selected { palette.selection } else { palette.border };
        self.draw_rounded_rect(pixmap, rect, theme.border_radius, palette.card, Some(outline));

        let inner_x = card.x + CARD_INSET;
        let inner_w = card.w - 2.0 * CARD_INSET;
        let mut name_x = inner_x;

        if let Some(icon_name) = &entry.icon {
            if let Some(icon) = self.icon_cache.get(icon_name, ICON_SIZE) {
                let y = (card.y + CARD_INSET - 2.0) as i32;
                pixmap.draw_pixmap(inner_x as i32, y, icon.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
                name_x += ICON_SIZE as f32 + 8.0;
            }
        }

        let name = ellipsize(&entry.name, chars_for(inner_w - (name_x - inner_x), NAME_SIZE));
        self.draw_text(pixmap, &name, name_x, card.y + CARD_INSET, NAME_SIZE, palette.name, false);

        // Description: at most two lines, ellipsized.
        let desc_y = card.y + CARD_INSET + NAME_SIZE + 10.0;
        let description = ellipsize(&entry.description, 2 * chars_for(inner_w, DESCRIPTION_SIZE));
        self.draw_text_block(pixmap, &description, inner_x, desc_y, inner_w, 2, DESCRIPTION_SIZE, palette.muted);

        let box_y = card.y + card.h - CARD_INSET - COMMAND_BOX_HEIGHT;
        if let Some(command_box) = Rect::from_xywh(inner_x, box_y, inner_w, COMMAND_BOX_HEIGHT) {
            self.draw_rounded_rect(pixmap, command_box, 6.0, palette.command_box, None);
        }
        let glyph_x = inner_x + inner_w - 22.0;
        let command = ellipsize(&entry.command, chars_for(glyph_x - inner_x - 12.0, COMMAND_SIZE));
        self.draw_text(pixmap, &command, inner_x + 10.0, box_y + 8.0, COMMAND_SIZE, palette.text, true);
        self.draw_copy_glyph(pixmap, glyph_x, box_y + 8.0, if selected { palette.text } else { palette.muted });
    }

    /// Two offset squares, the usual "copy" pictogram.
    fn draw_copy_glyph(&self, pixmap: &mut PixmapMut, x: f32, y: f32, color: Color) {
        let back = Rect::from_xywh(x + 4.0, y, 10.0, 10.0);
        let front = Rect::from_xywh(x, y + 4.0, 10.0, 10.0);
        if let (Some(back), Some(front)) = (back, front) {
            self.stroke_rounded_rect(pixmap, back, 2.0, color);
            self.stroke_rounded_rect(pixmap, front, 2.0, color);
        }
    }

    fn rounded_path(rect: Rect, radius: f32) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::new();
        let x = rect.left();
        let y = rect.top();
        let w = rect.width();
        let h = rect.height();
        let radius = radius.min(w / 2.0).min(h / 2.0);

        pb.move_to(x + radius, y);
        pb.line_to(x + w - radius, y);
        pb.quad_to(x + w, y, x + w, y + radius);
        pb.line_to(x + w, y + h - radius);
        pb.quad_to(x + w, y + h, x + w - radius, y + h);
        pb.line_to(x + radius, y + h);
        pb.quad_to(x, y + h, x, y + h - radius);
        pb.line_to(x, y + radius);
        pb.quad_to(x, y, x + radius, y);
        pb.close();
        pb.finish()
    }

    fn draw_rounded_rect(&self, pixmap: &mut PixmapMut, rect: Rect, radius: f32, fill: Color, stroke: Option<Color>) {
        let Some(path) = Self::rounded_path(rect, radius) else { return };

        let mut paint = Paint::default();
        paint.set_color(fill);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);

        if let Some(s_color) = stroke {
            let mut s_paint = Paint::default();
            s_paint.set_color(s_color);
            s_paint.anti_alias = true;
            let stroke_obj = Stroke { width: 1.5, ..Default::default() };
            pixmap.stroke_path(&path, &s_paint, &stroke_obj, Transform::identity(), None);
        }
    }

    fn stroke_rounded_rect(&self, pixmap: &mut PixmapMut, rect: Rect, radius: f32, color: Color) {
        let Some(path) = Self::rounded_path(rect, radius) else { return };
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        let stroke = Stroke { width: 1.2, ..Default::default() };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, size: f32, color: Color, monospace: bool) {
        let max_w = pixmap.width() as f32 - x;
        self.render_buffer(pixmap, text, x, y, max_w, size, 1, color, monospace);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text_block(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, w: f32, lines: usize, size: f32, color: Color) {
        self.render_buffer(pixmap, text, x, y, w, size, lines, color, false);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_buffer(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, w: f32, size: f32, lines: usize, color: Color, monospace: bool) {
        let line_height = size * 1.3;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, line_height));
        buffer.set_size(&mut self.font_system, Some(w.max(1.0)), Some(line_height * lines as f32));
        let attrs = if monospace { Attrs::new().family(Family::Monospace) } else { Attrs::new() };
        buffer.set_text(&mut self.font_system, text, attrs, cosmic_text::Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_color = cosmic_text::Color::rgba(
            (color.red() * 255.0) as u8,
            (color.green() * 255.0) as u8,
            (color.blue() * 255.0) as u8,
            (color.alpha() * 255.0) as u8,
        );

        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |draw_x, draw_y, w, h, color| {
            let draw_x = draw_x + x as i32;
            let draw_y = draw_y + y as i32;
            if w == 0 || h == 0 { return; }
            if draw_x >= 0 && draw_y >= 0 && draw_x < pixmap.width() as i32 && draw_y < pixmap.height() as i32 {
                let paint = Paint {
                    shader: tiny_skia::Shader::SolidColor(tiny_skia::Color::from_rgba8(color.r(), color.g(), color.b(), color.a())),
                    ..Paint::default()
                };
                if let Some(r) = Rect::from_xywh(draw_x as f32, draw_y as f32, w as f32, h as f32) {
                    pixmap.fill_rect(r, &paint, Transform::identity(), None);
                }
            }
        });
    }
}

/// Rough number of glyphs that fit in `width` at `size`.
fn chars_for(width: f32, size: f32) -> usize {
    (width / (size * 0.55)).max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chars_for() {
        assert_eq!(chars_for(111.0, 10.0), 20);
        assert_eq!(chars_for(-5.0, 10.0), 0);
    }

    #[test]
    fn test_palette_reads_theme_colors() {
        let theme = ThemeConfig { title: "ff0000ff".to_string(), ..ThemeConfig::default() };
        let palette = Palette::from_theme(&theme);
        assert_eq!(palette.title, Color::from_rgba8(255, 0, 0, 255));
        assert_eq!(palette.text, ThemeConfig::parse_color("e2e8f0ff"));
    }

    #[test]
    fn test_rounded_path_clamps_radius() {
        let rect = Rect::from_xywh(0.0, 0.0, 10.0, 4.0).unwrap();
        let path = Renderer::rounded_path(rect, 50.0).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 4.0);
    }
}
