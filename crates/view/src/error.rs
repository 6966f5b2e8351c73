use lineage_data::PersonId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("no tree is loaded")]
    NoTree,

    #[error("person {0} is not part of the tree")]
    UnknownPerson(PersonId),
}
