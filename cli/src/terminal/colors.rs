use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 220, g: 220, b: 220 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 190, g: 150, b: 255 };
pub const ONLINE: Color = Color::Green;
pub const OFFLINE: Color = Color::BrightBlack;
pub const ERROR: Color = Color::Red;
pub const UNKNOWN: Color = Color::Yellow;
