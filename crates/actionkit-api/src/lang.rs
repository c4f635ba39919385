//! User-facing text.
//!
//! Everything the UI shows by default lives here so hosts can see the
//! full vocabulary in one place.

use heck::ToTitleCase;

// =============================================================================
// Buttons
// =============================================================================

pub const CANCEL: &str = "Cancel";
pub const CREATE: &str = "Create";
pub const DELETE: &str = "Delete";
pub const EDIT: &str = "Edit";
pub const VIEW: &str = "View";
pub const FORCE_DELETE: &str = "Force Delete";
pub const RESTORE: &str = "Restore";
pub const EXPORT: &str = "Export";
pub const IMPORT: &str = "Import";
pub const REPLICATE: &str = "Replicate";
pub const DELETE_SELECTED: &str = "Delete Selected";
pub const BULK_ACTIONS: &str = "Bulk Actions";

// =============================================================================
// Tooltips
// =============================================================================

pub const TOOLTIP_EDIT: &str = "Edit this item";
pub const TOOLTIP_DELETE: &str = "Delete this item";
pub const TOOLTIP_VIEW: &str = "View details";
pub const TOOLTIP_FORCE_DELETE: &str = "Permanently delete this item";
pub const TOOLTIP_RESTORE: &str = "Restore this item";
pub const TOOLTIP_REPLICATE: &str = "Create a copy of this record";

// =============================================================================
// Modals
// =============================================================================

pub const CONFIRM_TITLE: &str = "Confirm Action";
pub const THIS_ACTION: &str = "perform this action";
pub const FORCE_DELETE_TITLE: &str = "Permanently Delete";
pub const FORCE_DELETE_DESCRIPTION: &str =
    "Are you sure you want to permanently delete this record? This action cannot be undone.";
pub const RESTORE_TITLE: &str = "Restore Record";
pub const RESTORE_DESCRIPTION: &str = "Are you sure you want to restore this record?";
pub const BULK_DELETE_DESCRIPTION: &str =
    "Are you sure you want to delete the selected items? This action cannot be undone.";
pub const BULK_FORCE_DELETE_TITLE: &str = "Permanently Delete Selected";
pub const BULK_FORCE_DELETE_DESCRIPTION: &str =
    "Are you sure you want to permanently delete the selected records? This action cannot be undone.";
pub const BULK_RESTORE_TITLE: &str = "Restore Selected";
pub const BULK_RESTORE_DESCRIPTION: &str = "Are you sure you want to restore the selected records?";
pub const REPLICATE_TITLE: &str = "Replicate Record";
pub const REPLICATE_DESCRIPTION: &str = "Are you sure you want to create a copy of this record?";
pub const IMPORT_TITLE: &str = "Import Data";
pub const IMPORT_DESCRIPTION: &str =
    "Upload a file to import data. Supported formats: XLSX, CSV.";
pub const IMPORT_FILE_FIELD: &str = "File";

// =============================================================================
// Messages
// =============================================================================

pub const SUCCESS: &str = "Success!";
pub const ACTION_EXECUTED: &str = "Action executed successfully";
pub const ACTION_FAILED: &str = "Action execution failed";
pub const ACTION_EXPIRED: &str = "Action not found or expired";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const CREATED: &str = "Record created successfully";
pub const DELETED: &str = "Record deleted successfully";
pub const FORCE_DELETED: &str = "Record permanently deleted";
pub const RESTORED: &str = "Record restored successfully";
pub const REPLICATED: &str = "Record replicated successfully.";
pub const NO_SELECTION_TITLE: &str = "No records selected";
pub const NO_SELECTION_BODY: &str = "Select at least one record to continue.";
pub const IMPORT_SUCCESS: &str = "Import completed successfully.";
pub const IMPORT_FAILED: &str = "Import failed. Please check your file and try again.";
pub const IMPORT_NO_FILE: &str = "No file provided for import.";
pub const IMPORTER_NOT_FOUND: &str = "Importer not found";

/// `Confirm {label}`.
pub fn confirm_heading(label: &str) -> String {
    format!("Confirm {}", label)
}

/// `Are you sure you want to {label}?`.
pub fn confirm_description(label: &str) -> String {
    format!("Are you sure you want to {}?", label)
}

/// `{count} records deleted`.
pub fn bulk_deleted(count: usize) -> String {
    format!("{} records deleted", count)
}

/// `{count} records restored`.
pub fn bulk_restored(count: usize) -> String {
    format!("{} records restored", count)
}

/// `{count} records permanently deleted`.
pub fn bulk_force_deleted(count: usize) -> String {
    format!("{} records permanently deleted", count)
}

/// Title-case an identifier: `force-delete` and `force_delete` become `Force Delete`.
pub fn headline(name: &str) -> String {
    name.to_title_case()
}
