//! CSS color parsing for `fillStyle` and `strokeStyle`

use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref HEX_REGEX: Regex = Regex::new(r"^#([0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap();
    static ref FUNC_REGEX: Regex = Regex::new(r"^(rgba?|hsla?)\(\s*([^)]*)\)$").unwrap();
    static ref ARG_SPLIT_REGEX: Regex = Regex::new(r"\s*[,/]\s*|\s+").unwrap();
}

/// Straight (non premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses a CSS color. Returns `None` for anything a canvas would ignore.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        if text.starts_with('#') {
            return parse_hex(&text);
        }
        if let Some(caps) = FUNC_REGEX.captures(&text) {
            let func = caps.get(1)?.as_str();
            let args: Vec<&str> = ARG_SPLIT_REGEX.split(caps.get(2)?.as_str().trim()).filter(|s| !s.is_empty()).collect();
            return if func.starts_with("rgb") { parse_rgb(&args) } else { parse_hsl(&args) };
        }
        named_color(&text)
    }

    /// CSS serialization as a canvas reports it back.
    pub fn to_css(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.a as f64 / 255.0 * 1000.0).round() / 1000.0;
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn parse_hex(text: &str) -> Option<Color> {
    let caps = HEX_REGEX.captures(text)?;
    let digits = caps.get(1)?.as_str();
    let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match digits.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_channel(arg: &str) -> Option<u8> {
    let value = if let Some(percent) = arg.strip_suffix('%') {
        percent.parse::<f64>().ok()? * 2.55
    } else {
        arg.parse::<f64>().ok()?
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(arg: Option<&&str>) -> Option<u8> {
    let Some(arg) = arg else {
        return Some(0xFF);
    };
    let value = if let Some(percent) = arg.strip_suffix('%') {
        percent.parse::<f64>().ok()? / 100.0
    } else {
        arg.parse::<f64>().ok()?
    };
    Some((value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_rgb(args: &[&str]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    Some(Color::rgba(
        parse_channel(args[0])?,
        parse_channel(args[1])?,
        parse_channel(args[2])?,
        parse_alpha(args.get(3))?,
    ))
}

fn parse_hsl(args: &[&str]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let hue = args[0].trim_end_matches("deg").parse::<f64>().ok()?.rem_euclid(360.0) / 360.0;
    let sat = args[1].trim_end_matches('%').parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;
    let light = args[2].trim_end_matches('%').parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;
    let alpha = parse_alpha(args.get(3))?;

    let q = if light < 0.5 { light * (1.0 + sat) } else { light + sat - light * sat };
    let p = 2.0 * light - q;
    let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(Color::rgba(
        to_byte(hue_to_rgb(p, q, hue + 1.0 / 3.0)),
        to_byte(hue_to_rgb(p, q, hue)),
        to_byte(hue_to_rgb(p, q, hue - 1.0 / 3.0)),
        alpha,
    ))
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(0xFF, 0x00, 0x00),
        "lime" => Color::rgb(0x00, 0xFF, 0x00),
        "green" => Color::rgb(0x00, 0x80, 0x00),
        "blue" => Color::rgb(0x00, 0x00, 0xFF),
        "yellow" => Color::rgb(0xFF, 0xFF, 0x00),
        "cyan" | "aqua" => Color::rgb(0x00, 0xFF, 0xFF),
        "magenta" | "fuchsia" => Color::rgb(0xFF, 0x00, 0xFF),
        "orange" => Color::rgb(0xFF, 0xA5, 0x00),
        "purple" => Color::rgb(0x80, 0x00, 0x80),
        "pink" => Color::rgb(0xFF, 0xC0, 0xCB),
        "gray" | "grey" => Color::rgb(0x80, 0x80, 0x80),
        "silver" => Color::rgb(0xC0, 0xC0, 0xC0),
        "maroon" => Color::rgb(0x80, 0x00, 0x00),
        "navy" => Color::rgb(0x00, 0x00, 0x80),
        "teal" => Color::rgb(0x00, 0x80, 0x80),
        "olive" => Color::rgb(0x80, 0x80, 0x00),
        "gold" => Color::rgb(0xFF, 0xD7, 0x00),
        "coral" => Color::rgb(0xFF, 0x7F, 0x50),
        "salmon" => Color::rgb(0xFA, 0x80, 0x72),
        "skyblue" => Color::rgb(0x87, 0xCE, 0xEB),
        "lightseagreen" => Color::rgb(0x20, 0xB2, 0xAA),
        "indigo" => Color::rgb(0x4B, 0x00, 0x82),
        "violet" => Color::rgb(0xEE, 0x82, 0xEE),
        "crimson" => Color::rgb(0xDC, 0x14, 0x3C),
        "tomato" => Color::rgb(0xFF, 0x63, 0x47),
        "turquoise" => Color::rgb(0x40, 0xE0, 0xD0),
        _ => return None,
    };
    Some(color)
}
