use crate::{Person, PersonId};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize, Hash)]
pub enum RelationshipKind {
    /// Directed: the subject is the child, the relative is the parent
    Parent,
    Spouse,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub subject_id: PersonId,
    pub relative_id: PersonId,
}

impl RelationshipEdge {
    pub fn parent(child: impl Into<PersonId>, parent: impl Into<PersonId>) -> Self {
        Self {
            id: None,
            kind: RelationshipKind::Parent,
            subject_id: child.into(),
            relative_id: parent.into(),
        }
    }

    pub fn spouse(a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self {
            id: None,
            kind: RelationshipKind::Spouse,
            subject_id: a.into(),
            relative_id: b.into(),
        }
    }
}

/// An immutable view of a whole family tree
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct TreeSnapshot {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
}

impl TreeSnapshot {
    pub fn new(persons: Vec<Person>, relationships: Vec<RelationshipEdge>) -> Self {
        Self {
            persons,
            relationships,
        }
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.person(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gender;
    use test_log::test;

    #[test]
    fn test_parse_api_json() -> anyhow::Result<()> {
        let json = r#"{
            "id": "tree-1",
            "name": "Smith family",
            "persons": [
                { "id": "a", "firstName": "Ada", "lastName": "Smith", "gender": "Female",
                  "birthDate": "1950-03-15", "deathDate": null },
                { "id": "b", "firstName": null, "lastName": "Smith", "gender": "Male",
                  "birthDate": "1948", "deathDate": null },
                { "id": "c" }
            ],
            "relationships": [
                { "id": "r1", "type": "Spouse", "subjectId": "a", "relativeId": "b" },
                { "id": "r2", "type": "Parent", "subjectId": "c", "relativeId": "a" }
            ]
        }"#;

        let tree: TreeSnapshot = serde_json::from_str(json)?;
        assert_eq!(tree.persons.len(), 3);
        assert_eq!(tree.persons[0].gender, Gender::Female);
        assert_eq!(tree.persons[1].full_name(), "Smith");
        assert_eq!(tree.persons[2].gender, Gender::Unknown);
        assert_eq!(tree.persons[2].full_name(), "");
        assert_eq!(tree.relationships[1], {
            let mut edge = RelationshipEdge::parent("c", "a");
            edge.id = Some("r2".to_string());
            edge
        });
        Ok(())
    }

    #[test]
    fn test_lookup() {
        let tree = TreeSnapshot::new(
            vec![Person::new("a"), Person::new("b").with_name("Bo", "Lind")],
            vec![RelationshipEdge::spouse("a", "b")],
        );
        assert!(tree.contains(&"a".into()));
        assert!(!tree.contains(&"z".into()));
        assert_eq!(tree.person(&"b".into()).map(Person::full_name), Some("Bo Lind".to_string()));
    }
}
