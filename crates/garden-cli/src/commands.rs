use garden_api::bangumi::BangumiClient;
use garden_api::dmhy::DmhyClient;
use garden_api::{Alliance, Episode, SearchQuery, Topic, TopicCategory};
use garden_core::fetcher::FetchingState;
use garden_core::models::StarredAnime;
use garden_core::{ApplicationState, GardenError};

use crate::cli::{join_keywords, Filters};

pub type State = ApplicationState<DmhyClient>;

pub async fn search(
    state: &State,
    keywords: &[String],
    category: Option<String>,
    alliance: Option<String>,
    single_page: bool,
    filters: Filters,
) -> Result<(), GardenError> {
    let query = SearchQuery {
        keywords: Some(join_keywords(keywords)),
        category: category.map(|id| TopicCategory {
            name: id.clone(),
            id,
        }),
        alliance: alliance.map(|id| Alliance::new(id.clone(), id)),
    };

    // Set before fetching so a starred search remembers them.
    apply_filters(state, filters);
    if single_page {
        state.replace_search_query(query);
        state.launch_fetch_next_page(false);
    } else {
        state.update_search_query(query);
    }
    state.fetcher().wait_idle().await;

    if let FetchingState::Failed(message) = state.fetcher().fetching_state() {
        return Err(GardenError::Fetch(message));
    }

    state.sync_organized_view();
    apply_filters(state, filters);
    let view = state.organized_view();
    let topics = view.visible_topics();
    if let Some(anime) = state.current_starred_anime() {
        println!("★ {}", anime.display_name);
    }
    if topics.is_empty() {
        println!("no topics found");
        return Ok(());
    }
    for topic in &topics {
        println!("{}", format_topic(topic, state));
    }

    let episodes: Vec<String> = view
        .available_episodes()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!();
    println!(
        "{} of {} topics, episodes: {}",
        topics.len(),
        state.topics().len(),
        if episodes.is_empty() {
            "-".to_string()
        } else {
            episodes.join(", ")
        }
    );
    if single_page && state.fetcher().has_more_pages() {
        println!("more pages available");
    }
    Ok(())
}

pub fn starred(state: &State) {
    let starred = state.data().starred_anime.value();
    if starred.is_empty() {
        println!("nothing starred");
        return;
    }
    for anime in &starred {
        println!("{}", format_starred(anime));
    }
}

pub fn star(
    state: &State,
    keywords: &[String],
    name: Option<String>,
    filters: Filters,
) -> Result<(), GardenError> {
    state.replace_search_query(SearchQuery::with_keywords(join_keywords(keywords)));
    apply_filters(state, filters);
    let anime = state.star_current(name)?;
    println!("starred {}", format_starred(&anime));
    Ok(())
}

pub fn unstar(state: &State, keywords: &[String]) -> Result<(), GardenError> {
    state.replace_search_query(SearchQuery::with_keywords(join_keywords(keywords)));
    match state.unstar_current()? {
        Some(anime) => println!("unstarred {}", anime.display_name),
        None => println!("not starred"),
    }
    Ok(())
}

pub fn watched(state: &State, keywords: &[String], episode: &str) -> Result<(), GardenError> {
    let keywords = join_keywords(keywords);
    state.replace_search_query(SearchQuery::with_keywords(keywords.clone()));
    let episode = Episode::new(episode);
    if !state.on_episode_downloaded(episode.clone())? {
        return Err(GardenError::InvalidInput(format!(
            "\"{keywords}\" is not starred"
        )));
    }
    println!("episode {episode} of \"{keywords}\" marked watched");
    Ok(())
}

pub fn is_watched(state: &State, keywords: &[String], episode: &str) {
    state.replace_search_query(SearchQuery::with_keywords(join_keywords(keywords)));
    let episode = Episode::new(episode);
    if state.is_episode_watched(&episode) {
        println!("episode {episode}: watched");
    } else {
        println!("episode {episode}: not watched");
    }
}

pub async fn persons(client: &BangumiClient, subject_id: i64) -> Result<(), GardenError> {
    let persons = client.subject_persons(subject_id).await?;
    if persons.is_empty() {
        println!("no persons credited");
    }
    for person in &persons {
        let careers: Vec<String> = person.career.iter().map(ToString::to_string).collect();
        println!(
            "{:>8}  {}  {} ({}; {})",
            person.id,
            person.relation,
            person.name,
            person.person_type,
            careers.join(", ")
        );
    }
    Ok(())
}

/// Select the given filters in the organized view, keeping the rest.
fn apply_filters(state: &State, filters: Filters) {
    let view = state.organized_view();
    if let Some(resolution) = filters.resolution {
        view.set_selected_resolution(Some(resolution));
    }
    if let Some(language) = filters.subtitle {
        view.set_selected_subtitle_language(Some(language));
    }
}

fn format_topic(topic: &Topic, state: &State) -> String {
    let watched = topic
        .details
        .episode
        .as_ref()
        .is_some_and(|e| state.is_episode_watched(e));
    let mark = if watched { "✓" } else { " " };
    let episode = topic
        .details
        .episode
        .as_ref()
        .map_or("--".to_string(), ToString::to_string);
    let resolution = topic
        .details
        .resolution
        .map_or("-".to_string(), |r| r.to_string());
    let subtitles: Vec<&str> = topic
        .details
        .subtitle_languages
        .iter()
        .map(|l| l.short_name())
        .collect();

    let mut line = format!(
        "{mark} {episode:>5} {resolution:>6} {:<7} {}",
        subtitles.join("/"),
        topic.raw_title
    );
    if let Some(size) = topic.size {
        line.push_str(&format!(" ({size})"));
    }
    if let Some(magnet) = &topic.magnet_link {
        line.push_str("\n        ");
        line.push_str(magnet);
    }
    line
}

fn format_starred(anime: &StarredAnime) -> String {
    let mut prefs = Vec::new();
    if let Some(alliance) = &anime.preferred_alliance {
        prefs.push(alliance.to_string());
    }
    if let Some(resolution) = anime.preferred_resolution {
        prefs.push(resolution.to_string());
    }
    if let Some(language) = anime.preferred_subtitle_language {
        prefs.push(language.short_name().to_string());
    }
    let watched: Vec<String> = anime
        .watched_episodes
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut line = format!("{} [{}]", anime.display_name, anime.search_query);
    if !prefs.is_empty() {
        line.push_str(&format!(" prefers {}", prefs.join(" ")));
    }
    if !watched.is_empty() {
        line.push_str(&format!(" watched {}", watched.join(", ")));
    }
    line
}
