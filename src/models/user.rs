use serde::{Deserialize, Serialize};

use super::EventSummary;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
}

impl UserInfo {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Profile page payload: the user plus the events they registered for.
/// The backend has shipped the user under both "userInfo" and "user".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(alias = "userInfo")]
    pub user: UserInfo,
    #[serde(default)]
    pub events: Vec<EventSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_profile_envelopes() {
        let with_user_info = r#"{
            "userInfo": {"email": "a@b.c", "firstName": "Ada", "lastName": "Lovelace"},
            "events": [{"id": 1, "name": "E", "date": "", "address": ""}]
        }"#;
        let profile: Profile = serde_json::from_str(with_user_info).expect("parse userInfo form");
        assert_eq!(profile.user.first_name, "Ada");
        assert_eq!(profile.events.len(), 1);

        let with_user = r#"{"user": {"email": "a@b.c", "firstName": "Ada", "lastName": ""}}"#;
        let profile: Profile = serde_json::from_str(with_user).expect("parse user form");
        assert_eq!(profile.user.email, "a@b.c");
        assert!(profile.events.is_empty());
    }

    #[test]
    fn full_name_falls_back_to_email() {
        let user = UserInfo {
            email: "solo@example.com".to_string(),
            ..UserInfo::default()
        };
        assert_eq!(user.full_name(), "solo@example.com");

        let named = UserInfo {
            email: "x@y.z".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
        };
        assert_eq!(named.full_name(), "Grace Hopper");
    }
}
