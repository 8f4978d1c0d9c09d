use iced::widget::{button, container, text};
use iced::{Background, Border, Color, Element, Length, Theme};

pub const PANEL_BACKGROUND: Color = Color::BLACK;
pub const CANVAS_BORDER: Color = Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

/// The three action buttons and their colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Capture,
    Resume,
    Speak,
}

impl ButtonKind {
    /// (normal, hovered)
    fn palette(self) -> (Color, Color) {
        use ButtonKind::*;
        match self {
            Capture => (Color::from_rgb8(0xFF, 0x44, 0x44), Color::from_rgb8(0xFF, 0x66, 0x66)),
            Resume => (Color::from_rgb8(0x44, 0xAA, 0x44), Color::from_rgb8(0x55, 0xBB, 0x55)),
            Speak => (Color::from_rgb8(0x44, 0x44, 0xFF), Color::from_rgb8(0x66, 0x66, 0xFF)),
        }
    }

    pub fn style(self) -> impl Fn(&Theme, button::Status) -> button::Style {
        move |_theme: &Theme, status: button::Status| {
            let (normal, hovered) = self.palette();
            let (background, text_color) = match status {
                button::Status::Hovered | button::Status::Pressed => (hovered, Color::WHITE),
                button::Status::Active => (normal, Color::WHITE),
                button::Status::Disabled => (
                    Color { a: 0.35, ..normal },
                    Color { a: 0.6, ..Color::WHITE },
                ),
            };

            button::Style {
                background: Some(Background::Color(background)),
                text_color,
                border: Border::default(),
                ..button::Style::default()
            }
        }
    }
}

pub fn panel_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(PANEL_BACKGROUND)),
        text_color: Some(Color::WHITE),
        ..container::Style::default()
    }
}

pub fn canvas_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(PANEL_BACKGROUND)),
        border: Border {
            color: CANVAS_BORDER,
            width: 1.0,
            radius: 0.0.into(),
        },
        ..container::Style::default()
    }
}

/// Section heading above each value field
pub fn header<'a, Message: 'a>(label: &'a str) -> Element<'a, Message> {
    text(label).size(14).color(Color::WHITE).into()
}

/// Wrapped value text under a heading
pub fn value<'a, Message: 'a>(content: &'a str) -> Element<'a, Message> {
    container(text(content).size(12).color(Color::WHITE))
        .width(Length::Fixed(400.0))
        .padding([5, 0])
        .into()
}
