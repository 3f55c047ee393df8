use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::notify::Notification;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Please provide both location and health condition details")]
    MissingFields,
}

impl IntakeError {
    pub fn notification(&self) -> Notification {
        match self {
            IntakeError::MissingFields => Notification::error("Required Fields Missing", self.to_string()),
        }
    }
}

/// What the results view needs to run a search. Carried from the search form to the
/// results view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub location: String,
    pub health_issue: String,
}

/// The home search form's inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIntake {
    pub location: String,
    /// Free-text symptoms or concerns.
    pub health_issue: String,
    /// A condition picked from autocomplete.
    pub selected_condition: Option<String>,
}

impl SearchIntake {
    pub fn can_submit(&self) -> bool {
        !self.location.trim().is_empty()
            && (non_empty(&self.health_issue).is_some()
                || self.selected_condition.as_deref().and_then(non_empty).is_some())
    }

    /// Validate and build the navigation state. Nothing is sent anywhere on failure.
    pub fn submit(&self) -> Result<SearchRequest, IntakeError> {
        if !self.can_submit() {
            return Err(IntakeError::MissingFields);
        }
        let location = non_empty(&self.location).ok_or(IntakeError::MissingFields)?;
        let free_text = non_empty(&self.health_issue);
        let condition = self.selected_condition.as_deref().and_then(non_empty);

        let health_issue = match (condition, free_text) {
            (Some(condition), Some(text)) => format!("{condition} - {text}"),
            (Some(condition), None) => condition.to_string(),
            (None, Some(text)) => text.to_string(),
            (None, None) => return Err(IntakeError::MissingFields),
        };

        Ok(SearchRequest {
            location: location.to_string(),
            health_issue,
        })
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_and_free_text_are_joined() {
        let intake = SearchIntake {
            location: "Dothan, AL".to_string(),
            health_issue: "chest pain".to_string(),
            selected_condition: Some("Cardiology".to_string()),
        };
        let request = intake.submit().unwrap();
        assert_eq!(request.health_issue, "Cardiology - chest pain");
        assert_eq!(request.location, "Dothan, AL");
    }

    #[test]
    fn either_half_alone_is_used_as_is() {
        let only_condition = SearchIntake {
            location: "Dothan, AL".to_string(),
            health_issue: String::new(),
            selected_condition: Some("Cardiology".to_string()),
        };
        assert_eq!(only_condition.submit().unwrap().health_issue, "Cardiology");

        let only_text = SearchIntake {
            location: "Dothan, AL".to_string(),
            health_issue: "chest pain".to_string(),
            selected_condition: None,
        };
        assert_eq!(only_text.submit().unwrap().health_issue, "chest pain");
    }

    #[test]
    fn missing_location_or_issue_is_rejected() {
        let no_location = SearchIntake {
            location: "  ".to_string(),
            health_issue: "chest pain".to_string(),
            selected_condition: None,
        };
        assert_eq!(no_location.submit(), Err(IntakeError::MissingFields));
        assert!(!no_location.can_submit());

        let no_issue = SearchIntake {
            location: "Dothan, AL".to_string(),
            ..SearchIntake::default()
        };
        assert_eq!(no_issue.submit(), Err(IntakeError::MissingFields));

        let note = IntakeError::MissingFields.notification();
        assert_eq!(note.title, "Required Fields Missing");
        assert!(note.is_error());
    }
}
