//! Field validation for post creation.
//!
//! Violations are collected across every field rather than short-circuiting
//! on the first, so the caller sees the full list in one round trip.

use crate::domain::NewPost;
use crate::error::FieldError;

/// Length bounds for post content. The defaults are policy, not invariant,
/// so deployments can tighten or relax them.
#[derive(Debug, Clone)]
pub struct ContentLimits {
    pub title: (usize, usize),
    pub description: (usize, usize),
    pub tag: (usize, usize),
    pub body: (usize, usize),
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            title: (4, 50),
            description: (4, 150),
            tag: (1, 50),
            body: (4, 5000),
        }
    }
}

impl ContentLimits {
    /// Check a new post against the limits, returning every violation found.
    pub fn check(&self, fields: &NewPost) -> Vec<FieldError> {
        let mut errors = Vec::new();

        check_length("title", &fields.title, self.title, &mut errors);
        check_length("description", &fields.description, self.description, &mut errors);
        check_length("body", &fields.body, self.body, &mut errors);

        if fields.tags.is_empty() {
            errors.push(FieldError {
                field: "tags",
                message: "at least one tag is required".to_string(),
            });
        }
        for tag in &fields.tags {
            let len = tag.chars().count();
            if len < self.tag.0 || len > self.tag.1 {
                errors.push(FieldError {
                    field: "tags",
                    message: format!(
                        "tag {tag:?} must be between {} and {} characters",
                        self.tag.0, self.tag.1
                    ),
                });
            }
        }

        errors
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
    errors: &mut Vec<FieldError>,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {min} and {max} characters"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> NewPost {
        NewPost {
            title: "A valid title".to_string(),
            description: "A valid description".to_string(),
            body: "A body long enough to pass".to_string(),
            tags: vec!["rust".to_string()],
        }
    }

    #[test]
    fn valid_fields_pass() {
        assert!(ContentLimits::default().check(&valid_fields()).is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let fields = NewPost {
            title: "ab".to_string(),
            description: "cd".to_string(),
            body: "ef".to_string(),
            tags: vec![],
        };

        let errors = ContentLimits::default().check(&fields);
        let fields_flagged: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields_flagged, vec!["title", "description", "body", "tags"]);
    }

    #[test]
    fn empty_tag_set_is_rejected() {
        let mut fields = valid_fields();
        fields.tags.clear();

        let errors = ContentLimits::default().check(&fields);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tags");
    }

    #[test]
    fn overlong_tag_is_rejected() {
        let mut fields = valid_fields();
        fields.tags.push("x".repeat(51));
        fields.tags.push(String::new());

        let errors = ContentLimits::default().check(&fields);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn limits_are_configurable() {
        let limits = ContentLimits {
            title: (1, 200),
            ..Default::default()
        };
        let mut fields = valid_fields();
        fields.title = "x".to_string();

        assert!(limits.check(&fields).is_empty());
    }
}
