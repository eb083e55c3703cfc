use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::Yellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const IPV4_ADDR: Color = Color::Cyan;
pub const IPV6_ADDR: Color = Color::Magenta;
pub const SUCCESS: Color = Color::Green;
pub const FAILURE: Color = Color::Red;
