use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScreenType {
    Mobile,
    Tablet,
    Desktop,
    Wide,
}

/// Upper bounds (inclusive) of each screen class, in terminal columns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenBreakpoints {
    pub mobile: f64,
    pub tablet: f64,
    pub desktop: f64,
}

impl Default for ScreenBreakpoints {
    fn default() -> Self {
        Self {
            mobile: 768.0,
            tablet: 1024.0,
            desktop: 1440.0,
        }
    }
}

impl ScreenBreakpoints {
    pub fn classify(&self, width: f64) -> ScreenType {
        if width <= self.mobile {
            ScreenType::Mobile
        } else if width <= self.tablet {
            ScreenType::Tablet
        } else if width <= self.desktop {
            ScreenType::Desktop
        } else {
            ScreenType::Wide
        }
    }
}

impl ScreenType {
    pub fn is_mobile(&self) -> bool {
        matches!(self, ScreenType::Mobile)
    }
}
