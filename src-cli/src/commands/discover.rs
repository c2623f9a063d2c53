use scoutline_core::Country;
use scoutline_scraper::ScrapeOrchestrator;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DiscoverSummary {
    pub countries: usize,
    pub competitions: usize,
    pub catalog: Vec<CountryLine>,
}

#[derive(Debug, Serialize)]
pub struct CountryLine {
    pub id: String,
    pub name: String,
    pub competitions: usize,
}

pub async fn run(orchestrator: &ScrapeOrchestrator, target: usize) -> anyhow::Result<DiscoverSummary> {
    let countries = orchestrator.discover_countries(target).await?;
    Ok(summarize(&countries))
}

fn summarize(countries: &[Country]) -> DiscoverSummary {
    let catalog: Vec<CountryLine> = countries
        .iter()
        .filter(|country| !country.id.is_international())
        .map(|country| CountryLine {
            id: country.id.to_string(),
            name: country.name.clone(),
            competitions: country.competitions.len(),
        })
        .collect();

    DiscoverSummary {
        countries: catalog.len(),
        competitions: catalog.iter().map(|line| line.competitions).sum(),
        catalog,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutline_core::{Competition, CompetitionId, CountryId};

    fn country(id: &str, competitions: &[&str]) -> Country {
        let mut country = Country {
            id: CountryId::new(id).unwrap(),
            name: format!("Country {id}"),
            flag_url: None,
            competitions: Vec::new(),
        };
        for competition in competitions {
            country.add_competition(Competition::partial(
                CompetitionId::new(*competition).unwrap(),
                *competition,
                "",
            ));
        }
        country
    }

    #[test]
    fn test_summary_skips_international_sentinel() {
        let mut international = Country::international();
        international.add_competition(Competition::partial(
            CompetitionId::new("CL").unwrap(),
            "UEFA Champions League",
            "",
        ));
        let countries = vec![
            country("189", &["GB1", "FAC"]),
            international,
            country("40", &["L1"]),
        ];

        let summary = summarize(&countries);
        assert_eq!(summary.countries, 2);
        assert_eq!(summary.competitions, 3);
        assert_eq!(summary.catalog[1].id, "40");
    }
}
