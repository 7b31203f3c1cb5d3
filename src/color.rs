use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use palette::Srgb;
use rand::Rng;

/// A color as sent to the device: always serialized as `#rrggbb`.
#[derive(Copy, Clone)]
pub struct HexColor(pub Srgb<u8>);

impl HexColor {
    pub fn new(red: u8, green: u8, blue: u8) -> HexColor {
        return HexColor(Srgb::new(red, green, blue));
    }

    /// Picks any of the 2^24 colors with equal probability.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> HexColor {
        let [red, green, blue]: [u8; 3] = rng.gen();
        return HexColor::new(red, green, blue);
    }

    /// Whether a form value asks for a random color.
    pub fn wants_random(input: &str) -> bool {
        let input = input.trim();
        input.is_empty() || input.eq_ignore_ascii_case("random")
    }

    /// Resolves a form value: empty or "random" picks a fresh random color.
    pub fn resolve<R: Rng + ?Sized>(input: Option<&str>, rng: &mut R) -> anyhow::Result<HexColor> {
        match input {
            Some(s) if !HexColor::wants_random(s) => s.parse(),
            _ => Ok(HexColor::random(rng)),
        }
    }
}

impl FromStr for HexColor {
    type Err = anyhow::Error;

    /// Accepts `#rgb`, `#rrggbb` and the same without the leading `#`.
    fn from_str(s: &str) -> anyhow::Result<HexColor> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("invalid color '{}': expected hex digits", s);
        }
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => bail!("invalid color '{}': expected 3 or 6 hex digits", s),
        };
        let value = u32::from_str_radix(&expanded, 16)
            .map_err(|e| anyhow!("invalid color '{}': {}", s, e))?;
        return Ok(HexColor::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ));
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }
}

impl PartialEq for HexColor {
    fn eq(&self, other: &HexColor) -> bool {
        self.0.into_components() == other.0.into_components()
    }
}

impl Eq for HexColor {}

impl fmt::Debug for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexColor({})", self)
    }
}

impl serde::Serialize for HexColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
