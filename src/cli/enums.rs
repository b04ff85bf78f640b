//! CLI enum types.

use clap::ValueEnum;

use crate::veo::AspectRatio;

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Ratio {
    #[default]
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<Ratio> for AspectRatio {
    fn from(r: Ratio) -> Self {
        match r {
            Ratio::Landscape => AspectRatio::Landscape,
            Ratio::Portrait => AspectRatio::Portrait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_converts_to_aspect_ratio() {
        assert_eq!(AspectRatio::from(Ratio::Landscape), AspectRatio::Landscape);
        assert_eq!(AspectRatio::from(Ratio::Portrait), AspectRatio::Portrait);
    }

    #[test]
    fn test_ratio_value_names() {
        assert_eq!(Ratio::from_str("16:9", false).unwrap(), Ratio::Landscape);
        assert_eq!(Ratio::from_str("9:16", false).unwrap(), Ratio::Portrait);
        assert!(Ratio::from_str("4:3", false).is_err());
    }
}
