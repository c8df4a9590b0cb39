use ratatui::style::{Color, Modifier, Style};

pub struct LyricStyles {
    pub before: Style,
    pub current: Style,
    pub after: Style,
    pub title: Style,
    pub muted: Style,
    pub placeholder: Style,
}

impl Default for LyricStyles {
    fn default() -> Self {
        Self {
            before: Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            current: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            after: Style::default(),
            title: Style::default().add_modifier(Modifier::BOLD),
            muted: Style::default().add_modifier(Modifier::DIM),
            placeholder: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}
