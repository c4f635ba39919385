//! Label, icon and color.

use crate::lang;

/// Icon placement relative to the label.
pub const DEFAULT_ICON_POSITION: &str = "before";

#[derive(Debug, Clone)]
pub struct Presentation {
    pub label: Option<String>,
    pub icon: Option<String>,
    pub icon_position: String,
    pub color: Option<String>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            label: None,
            icon: None,
            icon_position: DEFAULT_ICON_POSITION.to_string(),
            color: None,
        }
    }
}

impl Presentation {
    /// The explicit label, or the title-cased name.
    pub fn label(&self, name: Option<&str>) -> Option<String> {
        self.label
            .clone()
            .or_else(|| name.filter(|n| !n.is_empty()).map(lang::headline))
    }
}
