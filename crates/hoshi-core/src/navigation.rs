//! URL rewriting for the sub/dub switch and episode stepping.
//!
//! The host page performs the actual navigation; these helpers only compute
//! where to go.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// Translation mode of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sub,
    Dub,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Dub => "dub",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub" => Ok(Self::Sub),
            "dub" => Ok(Self::Dub),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Rewrite `mode` (and `title`, when given) in the query of `current`.
///
/// Other parameters keep their position; a parameter that was absent is
/// appended.
pub fn switch_mode(current: &Url, mode: Mode, title: Option<&str>) -> Url {
    let mut replacements: Vec<(&str, &str)> = vec![("mode", mode.as_str())];
    if let Some(title) = title {
        replacements.push(("title", title));
    }
    set_query_params(current, &replacements)
}

fn set_query_params(current: &Url, params: &[(&str, &str)]) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut written = vec![false; params.len()];

    for (key, value) in current.query_pairs() {
        match params.iter().position(|(k, _)| *k == key) {
            Some(i) if written[i] => {}
            Some(i) => {
                written[i] = true;
                pairs.push((key.into_owned(), params[i].1.to_string()));
            }
            None => pairs.push((key.into_owned(), value.into_owned())),
        }
    }
    for (i, (key, value)) in params.iter().enumerate() {
        if !written[i] {
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    let mut url = current.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

/// Position within a series on the player page (`/play/<id>?episode=&total=`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNav {
    pub anime_id: String,
    pub episode: u32,
    pub total: u32,
}

impl EpisodeNav {
    /// `total` is raised to at least `episode`, and `episode` to at least 1.
    pub fn new(anime_id: impl Into<String>, episode: u32, total: u32) -> Self {
        let episode = episode.max(1);
        Self {
            anime_id: anime_id.into(),
            episode,
            total: total.max(episode),
        }
    }

    /// Read the position from a player page URL.
    ///
    /// Missing or unparsable `episode` means 1; missing `total` means
    /// `episode`.
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        if segments.next()? != "play" {
            return None;
        }
        let anime_id = segments.next()?;
        let anime_id = percent_decode(anime_id);

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<u32>().ok())
        };
        let episode = param("episode").unwrap_or(1);
        let total = param("total").unwrap_or(episode);
        Some(Self::new(anime_id, episode, total))
    }

    pub fn has_previous(&self) -> bool {
        self.episode > 1
    }

    pub fn has_next(&self) -> bool {
        self.episode < self.total
    }

    pub fn previous(&self, base: &Url) -> Option<Url> {
        if !self.has_previous() {
            return None;
        }
        self.episode_url(base, self.episode - 1)
    }

    pub fn next(&self, base: &Url) -> Option<Url> {
        if !self.has_next() {
            return None;
        }
        self.episode_url(base, self.episode + 1)
    }

    /// URL of `episode` of this series on the same origin as `base`.
    pub fn episode_url(&self, base: &Url, episode: u32) -> Option<Url> {
        let mut url = base.clone();
        url.set_fragment(None);
        url.path_segments_mut()
            .ok()?
            .clear()
            .push("play")
            .push(&self.anime_id);
        url.query_pairs_mut()
            .clear()
            .append_pair("episode", &episode.to_string())
            .append_pair("total", &self.total.to_string());
        Some(url)
    }
}

fn percent_decode(segment: &str) -> String {
    // Round-trip through a query pair, which decodes %XX escapes.
    url::form_urlencoded::parse(format!("x={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}
