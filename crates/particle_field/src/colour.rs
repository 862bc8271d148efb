//! A packed 32-bit ARGB colour, the same layout hosts usually hand over as "colour ints".

use palette::Mix as _;

/// An ARGB colour packed into a `u32`: `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
#[expect(
    clippy::exhaustive_structs,
    reason = "A colour is only ever going to be a single packed integer"
)]
pub struct Colour(pub u32);

/// Opaque black.
pub const BLACK: Colour = Colour(0xFF00_0000);

/// Opaque white.
pub const WHITE: Colour = Colour(0xFFFF_FFFF);

/// Fully transparent black.
pub const TRANSPARENT: Colour = Colour(0);

impl Default for Colour {
    fn default() -> Self {
        BLACK
    }
}

impl Colour {
    /// Pack the individual channels.
    #[must_use]
    pub const fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(u32::from_be_bytes([alpha, red, green, blue]))
    }

    /// Unpack into `[alpha, red, green, blue]`.
    #[must_use]
    pub const fn channels(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// The alpha channel.
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.channels()[0]
    }

    /// The same colour with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [_, red, green, blue] = self.channels();
        Self::from_argb(alpha, red, green, blue)
    }

    /// Convert to a `palette` colour, dropping the alpha.
    #[must_use]
    pub fn to_srgb(self) -> palette::Srgb<f32> {
        let [_, red, green, blue] = self.channels();
        palette::Srgb::new(red, green, blue).into_format()
    }

    /// Convert from a `palette` colour.
    #[must_use]
    pub fn from_srgb(colour: palette::Srgb<f32>, alpha: u8) -> Self {
        let bytes: palette::Srgb<u8> = colour.into_format();
        Self::from_argb(alpha, bytes.red, bytes.green, bytes.blue)
    }

    /// Source-over composite `self` on top of `below`, mixing in linear light.
    #[must_use]
    pub fn over(self, below: Self) -> Self {
        let alpha = self.alpha();
        match alpha {
            u8::MAX => return self,
            0 => return below,
            _ => (),
        }

        let source_alpha = f32::from(alpha) / f32::from(u8::MAX);
        let below_alpha = f32::from(below.alpha()) / f32::from(u8::MAX);
        let below_weight = below_alpha * (1.0 - source_alpha);
        let out_alpha = source_alpha + below_weight;

        let source = self.to_srgb().into_linear();
        let underneath = below.to_srgb().into_linear();
        let mixed = (source * source_alpha + underneath * below_weight) / out_alpha;

        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "The alpha is clamped to the range of a `u8` before casting"
        )]
        let out_alpha_u8 = (out_alpha * f32::from(u8::MAX)).round().clamp(0.0, 255.0) as u8;

        Self::from_srgb(palette::Srgb::from_linear(mixed), out_alpha_u8)
    }
}

impl std::str::FromStr for Colour {
    type Err = crate::errors::ParticleFieldError;

    /// Accepts `#rrggbb`, `#rgb` (both opaque) and `#aarrggbb`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let hex = raw.trim().trim_start_matches('#');
        if hex.len() == 8 {
            let Ok(packed) = u32::from_str_radix(hex, 16) else {
                snafu::whatever!("Invalid ARGB colour: '{raw}'");
            };
            return Ok(Self(packed));
        }

        match hex.parse::<palette::Srgb<u8>>() {
            Ok(rgb) => Ok(Self::from_argb(u8::MAX, rgb.red, rgb.green, rgb.blue)),
            Err(error) => snafu::whatever!("Invalid colour '{raw}': {error}"),
        }
    }
}

impl TryFrom<String> for Colour {
    type Error = crate::errors::ParticleFieldError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.to_string()
    }
}

impl std::fmt::Display for Colour {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [alpha, red, green, blue] = self.channels();
        if alpha == u8::MAX {
            write!(formatter, "#{red:02x}{green:02x}{blue:02x}")
        } else {
            write!(formatter, "#{alpha:02x}{red:02x}{green:02x}{blue:02x}")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channels_round_trip_through_packing() {
        let colour = Colour::from_argb(0x12, 0x34, 0x56, 0x78);
        assert_eq!(colour.0, 0x1234_5678);
        assert_eq!(colour.channels(), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(colour.with_alpha(0xFF).0, 0xFF34_5678);
    }

    #[test]
    fn parses_hex_strings() {
        assert_eq!("#ff0000".parse::<Colour>().unwrap(), Colour(0xFFFF_0000));
        assert_eq!("#80112233".parse::<Colour>().unwrap(), Colour(0x8011_2233));
        assert!("#nothex".parse::<Colour>().is_err());
        assert_eq!(Colour(0xFFFF_0000).to_string(), "#ff0000");
        assert_eq!(Colour(0x8011_2233).to_string(), "#80112233");
    }

    #[test]
    fn opaque_over_replaces_and_transparent_over_keeps() {
        let red = Colour(0xFFFF_0000);
        assert_eq!(red.over(BLACK), red);
        assert_eq!(TRANSPARENT.over(red), red);
    }

    #[test]
    fn half_alpha_over_sits_between_the_two() {
        let blended = WHITE.with_alpha(128).over(BLACK);
        let [alpha, red, green, blue] = blended.channels();
        assert_eq!(alpha, 255);
        assert!(red > 0 && red < 255, "red was {red}");
        assert_eq!(red, green);
        assert_eq!(green, blue);
    }

    #[test]
    fn translucent_over_transparent_keeps_its_colour() {
        let blended = WHITE.with_alpha(128).over(TRANSPARENT);
        assert_eq!(blended.channels(), [128, 255, 255, 255]);

        let red = Colour(0x80FF_0000).over(Colour(0x0000_FF00));
        assert_eq!(red.channels(), [128, 255, 0, 0]);
    }

    #[test]
    fn translucent_over_translucent_weights_the_colour_below() {
        let blended = Colour(0x80FF_0000).over(Colour(0x8000_00FF));
        let [alpha, red, green, blue] = blended.channels();
        assert_eq!(alpha, 192);
        assert_eq!(green, 0);
        assert!(red > blue, "red {red}, blue {blue}");
    }
}
