use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Identifier of a person, as handed out by the tree store.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize, Default)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

/// A person of the tree. Only the id matters to the layout, the rest is
/// carried along for whoever draws the chart.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    /// `YYYY` or `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            first_name: None,
            last_name: None,
            gender: Gender::Unknown,
            birth_date: None,
            death_date: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_dates(mut self, birth: Option<&str>, death: Option<&str>) -> Self {
        self.birth_date = birth.map(str::to_string);
        self.death_date = death.map(str::to_string);
        self
    }

    /// First and last name joined by a space, empty when both are missing
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    }
}
