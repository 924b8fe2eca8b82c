//! # UI Styling Module
//!
//! Shared button styles for the sidebar. Each style is a palette of three
//! shades (idle, hovered, pressed) rendered with the same border treatment.

use iced::widget::button;
use iced::{Background, Border, Color};

/// Idle / hovered / pressed fill colours of one button family
#[derive(Debug, Clone, Copy)]
struct Palette {
    active: Color,
    hovered: Color,
    pressed: Color,
    border_width: f32,
}

const TEAL: Palette = Palette {
    active: Color::from_rgb(0.2, 0.6, 0.7),
    hovered: Color::from_rgb(0.3, 0.7, 0.8),
    pressed: Color::from_rgb(0.15, 0.5, 0.6),
    border_width: 2.0,
};

const GRAY: Palette = Palette {
    active: Color::from_rgb(0.4, 0.4, 0.4),
    hovered: Color::from_rgb(0.5, 0.5, 0.5),
    pressed: Color::from_rgb(0.35, 0.35, 0.35),
    border_width: 1.0,
};

const GREEN: Palette = Palette {
    active: Color::from_rgb(0.2, 0.7, 0.2),
    hovered: Color::from_rgb(0.3, 0.8, 0.3),
    pressed: Color::from_rgb(0.15, 0.6, 0.15),
    border_width: 1.0,
};

const RED: Palette = Palette {
    active: Color::from_rgb(0.8, 0.2, 0.2),
    hovered: Color::from_rgb(0.9, 0.3, 0.3),
    pressed: Color::from_rgb(0.7, 0.15, 0.15),
    border_width: 1.0,
};

fn lighten(color: Color) -> Color {
    Color::from_rgb(
        (color.r + 0.1).min(1.0),
        (color.g + 0.1).min(1.0),
        (color.b + 0.1).min(1.0),
    )
}

fn solid(fill: Color, border_width: f32) -> button::Style {
    button::Style {
        background: Some(Background::Color(fill)),
        text_color: Color::WHITE,
        border: Border {
            color: lighten(fill),
            width: border_width,
            radius: 4.0.into(),
        },
        ..Default::default()
    }
}

fn disabled() -> button::Style {
    button::Style {
        background: Some(Background::Color(Color::from_rgb(0.3, 0.3, 0.3))),
        text_color: Color::from_rgb(0.6, 0.6, 0.6),
        border: Border {
            color: Color::from_rgb(0.4, 0.4, 0.4),
            width: 1.0,
            radius: 4.0.into(),
        },
        ..Default::default()
    }
}

fn paint(palette: Palette, status: button::Status) -> button::Style {
    match status {
        button::Status::Active => solid(palette.active, palette.border_width),
        button::Status::Hovered => solid(palette.hovered, palette.border_width),
        button::Status::Pressed => solid(palette.pressed, palette.border_width),
        button::Status::Disabled => disabled(),
    }
}

/// Device list entry; selected devices are teal
pub fn device_button_style(is_selected: bool) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    let palette = if is_selected { TEAL } else { GRAY };
    move |_theme: &iced::Theme, status: button::Status| paint(palette, status)
}

/// Stride and history selectors; the active choice is teal
pub fn selector_button_style(is_active: bool) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    device_button_style(is_active)
}

pub fn connect_button_style() -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    |_theme: &iced::Theme, status: button::Status| paint(GREEN, status)
}

pub fn disconnect_button_style() -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    |_theme: &iced::Theme, status: button::Status| paint(RED, status)
}
