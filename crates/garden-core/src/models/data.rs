use serde::{Deserialize, Serialize};

use crate::keyed::KeyedList;
use crate::models::starred::StarredAnime;

/// Live user data. Lists are observable and shared with the application state.
#[derive(Clone)]
pub struct AppData {
    /// Starred searches, unique by `search_query`.
    pub starred_anime: KeyedList<String, StarredAnime>,
}

/// On-disk shape of `app.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppDataFile {
    #[serde(default)]
    pub starred_anime: Vec<StarredAnime>,
}

impl AppData {
    pub fn new() -> Self {
        Self {
            starred_anime: KeyedList::new(|a: &StarredAnime| a.search_query.clone()),
        }
    }

    /// Load a snapshot into the existing lists so subscribers keep working.
    pub fn load(&self, file: AppDataFile) {
        self.starred_anime.set(file.starred_anime);
    }

    pub fn snapshot(&self) -> AppDataFile {
        AppDataFile {
            starred_anime: self.starred_anime.value(),
        }
    }

    /// The starred record for exactly these keywords.
    pub fn find_starred(&self, keywords: Option<&str>) -> Option<StarredAnime> {
        self.starred_anime.find(|a| a.matches(keywords))
    }
}

impl Default for AppData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_keeps_subscribers() {
        let data = AppData::new();
        let rx = data.starred_anime.subscribe();
        data.load(AppDataFile {
            starred_anime: vec![StarredAnime::new("frieren", "Frieren")],
        });
        assert_eq!(rx.borrow().len(), 1);
    }

    #[test]
    fn test_duplicate_queries_collapse() {
        let data = AppData::new();
        let second = StarredAnime::new("frieren", "Frieren (renamed)");
        data.load(AppDataFile {
            starred_anime: vec![StarredAnime::new("frieren", "Frieren"), second],
        });
        let snapshot = data.snapshot();
        assert_eq!(snapshot.starred_anime.len(), 1);
        assert_eq!(snapshot.starred_anime[0].display_name, "Frieren (renamed)");
    }

    #[test]
    fn test_find_starred() {
        let data = AppData::new();
        data.starred_anime.upsert(StarredAnime::new("frieren", "Frieren"));
        assert!(data.find_starred(Some("frieren")).is_some());
        assert!(data.find_starred(Some("oshi no ko")).is_none());
        assert!(data.find_starred(None).is_none());
    }
}
