//! Controller configuration

/// Named constants used by [`crate::StylesController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesConfig {
    /// Owner id of the sheet holding styles for the editing stage itself
    pub stage_sheet_id: String,
    /// Owner id of the sheet new rules go to when no sheet is given
    pub default_sheet_id: String,
    /// Appended to every simple selector of a disabled rule so that it
    /// can no longer match
    pub disabled_marker: String,
    /// Prefix of generated class names when the caller supplies none
    pub generated_class_prefix: String,
    /// Prefix of generated class names shared by a group of elements
    pub generated_group_prefix: String,
    /// Length of the random part of a generated class name
    pub generated_suffix_length: usize,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            stage_sheet_id: "stylewright-stage-stylesheet".to_string(),
            default_sheet_id: "stylewright-default-stylesheet".to_string(),
            disabled_marker: ".stylewright-disabled-rule".to_string(),
            generated_class_prefix: "gen".to_string(),
            generated_group_prefix: "group".to_string(),
            generated_suffix_length: 4,
        }
    }
}
