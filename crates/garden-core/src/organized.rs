//! Topics organised by alliance, resolution and subtitle language, with the
//! user's current filter selection.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::watch;

use garden_api::{Alliance, Episode, Resolution, SubtitleLanguage, Topic};

use crate::keyed::KeyedList;
use crate::models::StarredAnime;

/// Current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSelection {
    pub alliance: Option<Alliance>,
    pub resolution: Option<Resolution>,
    pub subtitle_language: Option<SubtitleLanguage>,
}

impl ViewSelection {
    pub fn is_empty(&self) -> bool {
        self.alliance.is_none() && self.resolution.is_none() && self.subtitle_language.is_none()
    }

    pub fn matches(&self, topic: &Topic) -> bool {
        let alliance_ok = self.alliance.as_ref().map_or(true, |selected| {
            topic
                .alliance
                .as_ref()
                .is_some_and(|a| a.id == selected.id || a.name == selected.name)
        });
        let resolution_ok = self
            .resolution
            .map_or(true, |r| topic.details.resolution == Some(r));
        let subtitle_ok = self
            .subtitle_language
            .map_or(true, |l| topic.details.subtitle_languages.contains(&l));
        alliance_ok && resolution_ok && subtitle_ok
    }
}

pub struct OrganizedViewState {
    selected_alliance: watch::Sender<Option<Alliance>>,
    selected_resolution: watch::Sender<Option<Resolution>>,
    selected_subtitle_language: watch::Sender<Option<SubtitleLanguage>>,
    topics: watch::Sender<Vec<Topic>>,
    keywords: watch::Sender<Option<String>>,
}

impl OrganizedViewState {
    pub fn new() -> Self {
        Self {
            selected_alliance: watch::channel(None).0,
            selected_resolution: watch::channel(None).0,
            selected_subtitle_language: watch::channel(None).0,
            topics: watch::channel(Vec::new()).0,
            keywords: watch::channel(None).0,
        }
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn selection(&self) -> ViewSelection {
        ViewSelection {
            alliance: self.selected_alliance.borrow().clone(),
            resolution: *self.selected_resolution.borrow(),
            subtitle_language: *self.selected_subtitle_language.borrow(),
        }
    }

    pub fn set_selected_alliance(&self, alliance: Option<Alliance>) {
        self.selected_alliance.send_replace(alliance);
    }

    pub fn set_selected_resolution(&self, resolution: Option<Resolution>) {
        self.selected_resolution.send_replace(resolution);
    }

    pub fn set_selected_subtitle_language(&self, language: Option<SubtitleLanguage>) {
        self.selected_subtitle_language.send_replace(language);
    }

    /// Replace the selection with a starred record's preferences, or clear it.
    pub fn apply_preferences(&self, starred: Option<&StarredAnime>) {
        self.set_selected_alliance(starred.and_then(|a| a.preferred_alliance.clone()));
        self.set_selected_resolution(starred.and_then(|a| a.preferred_resolution));
        self.set_selected_subtitle_language(starred.and_then(|a| a.preferred_subtitle_language));
    }

    pub fn subscribe_selected_alliance(&self) -> watch::Receiver<Option<Alliance>> {
        self.selected_alliance.subscribe()
    }

    pub fn subscribe_selected_resolution(&self) -> watch::Receiver<Option<Resolution>> {
        self.selected_resolution.subscribe()
    }

    pub fn subscribe_selected_subtitle_language(
        &self,
    ) -> watch::Receiver<Option<SubtitleLanguage>> {
        self.selected_subtitle_language.subscribe()
    }

    // ── Topics ──────────────────────────────────────────────────────

    pub fn set_topics(&self, topics: Vec<Topic>, keywords: Option<String>) {
        self.keywords.send_replace(keywords);
        self.topics.send_replace(topics);
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.topics.borrow().clone()
    }

    pub fn keywords(&self) -> Option<String> {
        self.keywords.borrow().clone()
    }

    pub fn subscribe_topics(&self) -> watch::Receiver<Vec<Topic>> {
        self.topics.subscribe()
    }

    /// Topics passing the current selection, in feed order.
    pub fn visible_topics(&self) -> Vec<Topic> {
        let selection = self.selection();
        self.topics
            .borrow()
            .iter()
            .filter(|t| selection.matches(t))
            .cloned()
            .collect()
    }

    /// Alliances present in the topics, most prolific first.
    pub fn available_alliances(&self) -> Vec<Alliance> {
        let mut counts: HashMap<Alliance, usize> = HashMap::new();
        for alliance in self.topics.borrow().iter().filter_map(|t| t.alliance.clone()) {
            *counts.entry(alliance).or_default() += 1;
        }
        let mut alliances: Vec<(Alliance, usize)> = counts.into_iter().collect();
        alliances.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.name.cmp(&b.name)));
        alliances.into_iter().map(|(a, _)| a).collect()
    }

    /// Resolutions present in the topics, highest first.
    pub fn available_resolutions(&self) -> Vec<Resolution> {
        let set: BTreeSet<Resolution> = self
            .topics
            .borrow()
            .iter()
            .filter_map(|t| t.details.resolution)
            .collect();
        set.into_iter().rev().collect()
    }

    pub fn available_subtitle_languages(&self) -> Vec<SubtitleLanguage> {
        let set: BTreeSet<SubtitleLanguage> = self
            .topics
            .borrow()
            .iter()
            .flat_map(|t| t.details.subtitle_languages.iter().copied())
            .collect();
        set.into_iter().collect()
    }

    /// Episodes among the visible topics, in episode order.
    pub fn available_episodes(&self) -> Vec<Episode> {
        let set: BTreeSet<Episode> = self
            .visible_topics()
            .into_iter()
            .filter_map(|t| t.details.episode)
            .collect();
        set.into_iter().collect()
    }
}

impl Default for OrganizedViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy the view's non-empty selections into the starred record for
/// `keywords`. Returns true if a record changed.
pub fn update_starred_anime(
    starred: &KeyedList<String, StarredAnime>,
    keywords: &str,
    view: &OrganizedViewState,
) -> bool {
    let selection = view.selection();
    if selection.is_empty() {
        return false;
    }

    let changed = starred.update(&keywords.to_string(), |anime| {
        let before = (
            anime.preferred_alliance.clone(),
            anime.preferred_resolution,
            anime.preferred_subtitle_language,
        );
        if let Some(alliance) = selection.alliance {
            anime.preferred_alliance = Some(alliance);
        }
        if let Some(resolution) = selection.resolution {
            anime.preferred_resolution = Some(resolution);
        }
        if let Some(language) = selection.subtitle_language {
            anime.preferred_subtitle_language = Some(language);
        }
        before
            != (
                anime.preferred_alliance.clone(),
                anime.preferred_resolution,
                anime.preferred_subtitle_language,
            )
    });
    changed.unwrap_or(false)
}
