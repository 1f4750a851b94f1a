//! RGBA accent colors

use serde::{Deserialize, Serialize};

/// An RGBA color with one byte per channel.
///
/// The default is opaque black, which is what a site falls back to when no
/// favicon color can be derived.
///
/// # Examples
///
/// ```
/// use relay::Rgba;
///
/// assert_eq!(Rgba::from([1, 4, 9]), Rgba::new(1, 4, 9, 255));
/// assert_eq!(Rgba::default(), Rgba::new(0, 0, 0, 255));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// An opaque color from its RGB channels
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 255)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::opaque(0, 0, 0)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self::new(red, green, blue, alpha)
    }
}

impl From<[u8; 3]> for Rgba {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::opaque(red, green, blue)
    }
}

impl From<(u8, u8, u8, u8)> for Rgba {
    fn from((red, green, blue, alpha): (u8, u8, u8, u8)) -> Self {
        Self::new(red, green, blue, alpha)
    }
}
