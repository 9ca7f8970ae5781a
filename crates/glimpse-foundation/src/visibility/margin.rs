//! Root margin values in CSS shorthand (`"10px 20% 0px"`).

use glimpse_ui_graphics::{EdgeInsets, Rect};
use std::fmt;
use std::str::FromStr;

/// One side of a root margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    Px(f32),
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent(f32),
}

impl MarginLength {
    pub fn resolve(&self, basis: f32) -> f32 {
        match self {
            MarginLength::Px(px) => *px,
            MarginLength::Percent(percent) => basis * percent / 100.0,
        }
    }

    /// Same resolved offset for every root. Zero lengths match across units.
    pub fn is_equivalent(&self, other: &MarginLength) -> bool {
        match (self, other) {
            (MarginLength::Px(a), MarginLength::Px(b))
            | (MarginLength::Percent(a), MarginLength::Percent(b)) => a == b,
            (MarginLength::Px(a), MarginLength::Percent(b))
            | (MarginLength::Percent(a), MarginLength::Px(b)) => *a == 0.0 && *b == 0.0,
        }
    }

    fn parse(component: &str) -> Result<Self, MarginParseError> {
        let invalid = || MarginParseError::InvalidComponent {
            component: component.to_string(),
        };
        let (number, unit): (&str, fn(f32) -> MarginLength) =
            if let Some(number) = component.strip_suffix("px") {
                (number, MarginLength::Px)
            } else if let Some(number) = component.strip_suffix('%') {
                (number, MarginLength::Percent)
            } else if component == "0" {
                return Ok(MarginLength::Px(0.0));
            } else {
                return Err(invalid());
            };
        match number.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(unit(value)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(v) => write!(f, "{v}px"),
            MarginLength::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Offsets applied to the root bounds before intersecting.
///
/// Positive values grow the root, negative values shrink it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin::uniform(MarginLength::Percent(0.0));

    pub const fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Parses one to four whitespace-separated components, expanded like the
    /// CSS `margin` shorthand.
    pub fn parse(input: &str) -> Result<Self, MarginParseError> {
        let components = input
            .split_whitespace()
            .map(MarginLength::parse)
            .collect::<Result<Vec<_>, _>>()?;
        match components.as_slice() {
            [] => Err(MarginParseError::Empty),
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(MarginParseError::TooManyComponents {
                count: components.len(),
            }),
        }
    }

    /// Side-by-side [`MarginLength::is_equivalent`], so `"0"` matches `"0%"`.
    pub fn is_equivalent(&self, other: &RootMargin) -> bool {
        self.top.is_equivalent(&other.top)
            && self.right.is_equivalent(&other.right)
            && self.bottom.is_equivalent(&other.bottom)
            && self.left.is_equivalent(&other.left)
    }

    /// Resolves percentages against `root` and returns the insets to outset it by.
    pub fn resolve(&self, root: Rect) -> EdgeInsets {
        EdgeInsets::from_components(
            self.left.resolve(root.width),
            self.top.resolve(root.height),
            self.right.resolve(root.width),
            self.bottom.resolve(root.height),
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginParseError {
    Empty,
    TooManyComponents { count: usize },
    InvalidComponent { component: String },
}

impl fmt::Display for MarginParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginParseError::Empty => f.write_str("root margin is empty"),
            MarginParseError::TooManyComponents { count } => {
                write!(f, "root margin has {count} components; at most 4 are allowed")
            }
            MarginParseError::InvalidComponent { component } => write!(
                f,
                "root margin component {component:?} must be a length in px or a percentage"
            ),
        }
    }
}

impl std::error::Error for MarginParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_applies_to_all_sides() {
        let margin = RootMargin::parse("10px").unwrap();
        assert_eq!(margin, RootMargin::uniform(MarginLength::Px(10.0)));
    }

    #[test]
    fn shorthand_expansion() {
        let two = RootMargin::parse("10px 5%").unwrap();
        assert_eq!(two.top, MarginLength::Px(10.0));
        assert_eq!(two.left, MarginLength::Percent(5.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.bottom, MarginLength::Px(3.0));
        assert_eq!(three.left, MarginLength::Px(2.0));

        let four: RootMargin = "1px 2px 3px -4px".parse().unwrap();
        assert_eq!(four.left, MarginLength::Px(-4.0));
    }

    #[test]
    fn bare_zero_is_allowed() {
        assert_eq!(
            RootMargin::parse("0 0").unwrap(),
            RootMargin::uniform(MarginLength::Px(0.0))
        );
    }

    #[test]
    fn zero_margins_are_equivalent_across_units() {
        let bare = RootMargin::parse("0").unwrap();
        assert_ne!(bare, RootMargin::default());
        assert!(bare.is_equivalent(&RootMargin::default()));
        assert!(!RootMargin::parse("10px")
            .unwrap()
            .is_equivalent(&RootMargin::parse("10%").unwrap()));
        assert!(!bare.is_equivalent(&RootMargin::parse("0 1px").unwrap()));
    }

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(RootMargin::parse("   "), Err(MarginParseError::Empty));
        assert_eq!(
            RootMargin::parse("1px 1px 1px 1px 1px"),
            Err(MarginParseError::TooManyComponents { count: 5 })
        );
        assert_eq!(
            RootMargin::parse("10em"),
            Err(MarginParseError::InvalidComponent {
                component: "10em".to_string()
            })
        );
        assert!(RootMargin::parse("px").is_err());
        assert!(RootMargin::parse("5").is_err());
    }

    #[test]
    fn percentages_resolve_against_root_axes() {
        let margin = RootMargin::parse("10% 50%").unwrap();
        let insets = margin.resolve(Rect::new(0.0, 0.0, 200.0, 1000.0));
        assert_eq!(insets, EdgeInsets::from_components(100.0, 100.0, 100.0, 100.0));
    }

    #[test]
    fn display_is_canonical() {
        let margin = RootMargin::parse("10px 5%").unwrap();
        assert_eq!(margin.to_string(), "10px 5% 10px 5%");
        assert_eq!(RootMargin::default().to_string(), "0% 0% 0% 0%");
    }
}
