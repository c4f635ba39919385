//! Confirmation and modal metadata.

use crate::lang;
use crate::schema::Field;

/// Modal configuration of an action.
///
/// Heading, description, icon and icon color fall back to defaults derived
/// from the action when confirmation is required and they are unset.
#[derive(Debug, Clone, Default)]
pub struct Modal {
    pub enabled: bool,
    pub requires_confirmation: bool,
    pub heading: Option<String>,
    pub description: Option<String>,
    pub submit_label: Option<String>,
    pub cancel_label: Option<String>,
    pub icon: Option<String>,
    pub icon_color: Option<String>,
    pub form_schema: Vec<Field>,
    pub infolist_schema: Vec<Field>,
    pub width: Option<String>,
    pub view_only: bool,
    pub requires_password: bool,
    pub slide_over: bool,
    pub content: Option<String>,
}

impl Modal {
    /// True if explicitly enabled, confirming, or carrying a schema.
    pub fn has_modal(&self) -> bool {
        self.enabled
            || self.requires_confirmation
            || !self.form_schema.is_empty()
            || !self.infolist_schema.is_empty()
    }

    /// Slide-overs always confirm.
    pub fn set_slide_over(&mut self, value: bool) {
        self.slide_over = value;
        self.requires_confirmation = value;
    }

    /// Password prompts always confirm.
    pub fn set_requires_password(&mut self, value: bool) {
        self.requires_password = value;
        self.requires_confirmation = value;
    }

    pub fn heading(&self, label: Option<&str>) -> Option<String> {
        if self.heading.is_some() {
            return self.heading.clone();
        }
        if !self.requires_confirmation {
            return None;
        }
        Some(match label {
            Some(label) => lang::confirm_heading(label),
            None => lang::CONFIRM_TITLE.to_string(),
        })
    }

    pub fn description(&self, label: Option<&str>) -> Option<String> {
        if self.description.is_some() {
            return self.description.clone();
        }
        if !self.requires_confirmation {
            return None;
        }
        Some(lang::confirm_description(label.unwrap_or(lang::THIS_ACTION)))
    }

    pub fn icon(&self, action_icon: Option<&str>) -> Option<String> {
        if self.icon.is_some() {
            return self.icon.clone();
        }
        if !self.requires_confirmation {
            return None;
        }
        Some(action_icon.unwrap_or("alert-circle").to_string())
    }

    pub fn icon_color(&self, action_color: Option<&str>) -> Option<String> {
        if self.icon_color.is_some() {
            return self.icon_color.clone();
        }
        if !self.requires_confirmation {
            return None;
        }
        Some(action_color.unwrap_or("primary").to_string())
    }
}
