use scoutline_core::{ClubId, CompetitionId, CountryId, PlayerId, SeasonId, SiteConfig};

/// Flag images are served from the site's CDN, keyed by country ID.
const FLAG_URL_PREFIX: &str = "https://tmssl.akamaized.net/images/flagge/tiny";

/// Builds the site URLs the scraper visits.
///
/// Paths use `-` as the slug segment; the site resolves pages by ID alone.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base_url: String,
    entry_path: String,
    search_path: String,
}

impl SiteUrls {
    #[must_use]
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            entry_path: site.entry_path.clone(),
            search_path: site.search_path.clone(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a site-relative link against the base URL.
    #[must_use]
    pub fn absolute(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else if let Some(rest) = link.strip_prefix("//") {
            format!("https://{rest}")
        } else if link.starts_with('/') {
            format!("{}{}", self.base_url, link)
        } else {
            format!("{}/{}", self.base_url, link)
        }
    }

    /// Page hosting the country quick select.
    #[must_use]
    pub fn entry_url(&self) -> String {
        self.absolute(&self.entry_path)
    }

    /// Relative path of one page of competition search results.
    #[must_use]
    pub fn search_path(&self, query: &str, page: u32) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!(
            "{}?query={}&Wettbewerb_page={}",
            self.search_path, encoded, page
        )
    }

    #[must_use]
    pub fn competition_url(&self, competition: &CompetitionId) -> String {
        self.absolute(&format!("/-/startseite/wettbewerb/{competition}"))
    }

    #[must_use]
    pub fn club_squad_url(&self, club: &ClubId) -> String {
        self.absolute(&format!("/-/kader/verein/{club}/plus/1"))
    }

    #[must_use]
    pub fn player_profile_url(&self, player: &PlayerId) -> String {
        self.absolute(&format!("/-/profil/spieler/{player}"))
    }

    /// Stats page carrying the season selector.
    #[must_use]
    pub fn player_stats_url(&self, player: &PlayerId) -> String {
        self.absolute(&format!("/-/leistungsdatendetails/spieler/{player}"))
    }

    /// Detailed stats of one season, including the per-match tables.
    #[must_use]
    pub fn season_stats_url(&self, player: &PlayerId, season: &SeasonId) -> String {
        self.absolute(&format!(
            "/-/leistungsdatendetails/spieler/{player}/saison/{season}/plus/1"
        ))
    }

    /// Relative path of a player's market-value history endpoint.
    #[must_use]
    pub fn market_value_path(player: &PlayerId) -> String {
        format!("/ceapi/marketValueDevelopment/graph/{player}")
    }

    #[must_use]
    pub fn flag_url(country: &CountryId) -> String {
        format!("{FLAG_URL_PREFIX}/{country}.png")
    }
}
