use crate::config::{CategoryQueryTerms, RouteGeneratorConfig};
use crate::error::{AppError, Result};
use crate::models::{Coordinates, PlaceResult, PoiCategory};
use crate::services::place_search::PlaceSearch;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fans category lookups out to the place-search service.
#[derive(Clone)]
pub struct PoiService {
    search: Arc<dyn PlaceSearch>,
    query_terms: CategoryQueryTerms,
    timeout: Duration,
}

impl PoiService {
    pub fn new(search: Arc<dyn PlaceSearch>, config: &RouteGeneratorConfig) -> Self {
        PoiService {
            search,
            query_terms: config.category_query_terms.clone(),
            timeout: Duration::from_millis(config.poi_search_timeout_ms),
        }
    }

    /// One concurrent search per query term, each with its own timeout.
    /// A failing or slow term is logged and skipped; the other terms still
    /// count. Cancellation is honoured at the join.
    pub async fn find_places(
        &self,
        center: &Coordinates,
        radius_m: f64,
        categories: &[PoiCategory],
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<PoiCategory, Vec<PlaceResult>>> {
        let lookups: Vec<(PoiCategory, String)> = categories
            .iter()
            .flat_map(|category| {
                self.query_terms
                    .terms(category)
                    .into_iter()
                    .map(move |term| (*category, term))
            })
            .collect();

        tracing::info!(
            categories = categories.len(),
            queries = lookups.len(),
            radius_m = %format!("{:.0}", radius_m),
            "Searching POIs: {} queries across {} categories within {:.0}m",
            lookups.len(), categories.len(), radius_m
        );

        let search_futures = lookups.iter().map(|(category, term)| {
            let search = self.search.clone();
            let timeout = self.timeout;
            async move {
                let result =
                    tokio::time::timeout(timeout, search.search(term, center, radius_m)).await;
                (*category, term.as_str(), result)
            }
        });

        let results = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            results = futures::future::join_all(search_futures) => results,
        };

        let mut places: BTreeMap<PoiCategory, Vec<PlaceResult>> =
            categories.iter().map(|c| (*c, Vec::new())).collect();
        let mut failed = 0;

        for (category, term, result) in results {
            match result {
                Ok(Ok(found)) => {
                    places.entry(category).or_default().extend(found);
                }
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::warn!(
                        category = %category,
                        term = term,
                        error = %e,
                        "POI search for '{}' ({}) failed: {}",
                        term, category, e
                    );
                }
                Err(_) => {
                    failed += 1;
                    tracing::warn!(
                        category = %category,
                        term = term,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "POI search for '{}' ({}) timed out",
                        term, category
                    );
                }
            }
        }

        let total: usize = places.values().map(Vec::len).sum();
        tracing::info!(
            found = total,
            failed_queries = failed,
            "POI search complete: {} places, {}/{} queries failed",
            total, failed, lookups.len()
        );

        Ok(places)
    }
}
