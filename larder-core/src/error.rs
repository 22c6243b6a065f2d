use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation failure.
///
/// Messages are grouped per input field so the HTTP layer can return them
/// as-is, e.g. `{"title": ["This field may not be blank."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<String>>,
}

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error on a single field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(name, message);
        err
    }

    pub fn add(&mut self, name: &str, message: impl Into<String>) {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationError) {
        for (name, messages) in other.fields {
            self.fields.entry(name).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Vec<String>> {
        self.fields
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid input")?;
        let mut sep = ": ";
        for (name, messages) in &self.fields {
            for message in messages {
                write!(f, "{sep}{name}: {message}")?;
                sep = "; ";
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_ok() {
        assert!(ValidationError::new().into_result().is_ok());
    }

    #[test]
    fn test_merge_keeps_all_messages() {
        let mut err = ValidationError::field("title", BLANK);
        err.merge(ValidationError::field("title", "Too long."));
        err.merge(ValidationError::field("price", "Bad."));

        assert_eq!(err.fields()["title"].len(), 2);
        assert_eq!(err.fields()["price"], vec!["Bad.".to_string()]);
    }

    #[test]
    fn test_display_lists_fields() {
        let err = ValidationError::field("email", REQUIRED);
        assert_eq!(
            err.to_string(),
            "Invalid input: email: This field is required."
        );
    }
}
