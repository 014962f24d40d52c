use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// A person credited on a subject, as returned by `GET /v0/subjects/{id}/persons`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPerson {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub person_type: PersonType,
    pub career: Vec<PersonCareer>,
    /// Role on the subject, e.g. "原作", "导演".
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<PersonImages>,
}

/// Kind of person entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum PersonType {
    Individual = 1,
    Company = 2,
    Band = 3,
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Company => write!(f, "company"),
            Self::Band => write!(f, "band"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonCareer {
    Producer,
    Mangaka,
    Artist,
    Seiyu,
    Writer,
    Illustrator,
    Actor,
}

impl fmt::Display for PersonCareer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Producer => "producer",
            Self::Mangaka => "mangaka",
            Self::Artist => "artist",
            Self::Seiyu => "seiyu",
            Self::Writer => "writer",
            Self::Illustrator => "illustrator",
            Self::Actor => "actor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonImages {
    pub large: String,
    pub medium: String,
    pub small: String,
    pub grid: String,
}
