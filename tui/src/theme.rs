use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};
use termines_core::StyleTag;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Default,
    Light,
    Dark,
    Mono,
}

/// Binds cell style tags to terminal colours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    name: ThemeName,
    base: Style,
}

impl Theme {
    pub fn new(name: ThemeName) -> Self {
        use ThemeName::*;
        let base = match name {
            Default | Mono => Style::default().fg(Color::Reset).bg(Color::Reset),
            Light => Style::default().fg(Color::Indexed(234)).bg(Color::Indexed(254)),
            Dark => Style::default().fg(Color::Indexed(254)).bg(Color::Indexed(234)),
        };
        Self { name, base }
    }

    pub fn name(&self) -> ThemeName {
        self.name
    }

    pub fn base(&self) -> Style {
        self.base
    }

    pub fn highlight(&self) -> Style {
        self.base.add_modifier(Modifier::REVERSED)
    }

    pub fn cell(&self, tag: StyleTag) -> Style {
        if self.name == ThemeName::Mono {
            return self.base;
        }

        match tag {
            StyleTag::Hidden | StyleTag::Count(0) => self.base,
            StyleTag::Flag | StyleTag::Mine => self.base.bg(Color::Red),
            StyleTag::Count(n) => self.base.fg(count_color(n)),
        }
    }
}

fn count_color(n: u8) -> Color {
    match n {
        1 => Color::Indexed(27),
        2 => Color::Indexed(34),
        3 => Color::Red,
        4 => Color::Indexed(205),
        5 => Color::Indexed(124),
        6 => Color::Indexed(45),
        7 => Color::Indexed(92),
        _ => Color::Gray,
    }
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_ignores_tags() {
        let theme = Theme::new(ThemeName::Mono);
        assert_eq!(theme.cell(StyleTag::Mine), theme.base());
        assert_eq!(theme.cell(StyleTag::Count(3)), theme.base());
    }

    #[test]
    fn flags_and_mines_stand_out() {
        let theme = Theme::new(ThemeName::Dark);
        assert_eq!(theme.cell(StyleTag::Flag).bg, Some(Color::Red));
        assert_eq!(theme.cell(StyleTag::Count(1)).fg, Some(Color::Indexed(27)));
        assert_eq!(theme.cell(StyleTag::Hidden), theme.base());
    }
}
