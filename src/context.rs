use ratatui::style::Style;

#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub depth: u16,
    pub connectors: &'a [bool],
    pub is_last: bool,
    pub draw_lines: bool,
    pub line_style: Style,
    pub loading_style: Style,
}
