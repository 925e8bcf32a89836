// Market analysis over a page of search results

use serde::Serialize;

use crate::{
    autoyard_api::AutoyardClient,
    error::ApiError,
    history::SearchHistory,
    models::{Car, SearchFilters, SearchRecord},
};

// How many of the cheapest listings a market scan keeps
const SCAN_KEEP: usize = 5;

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub average: f64,
    pub best_price: i64, // price at the 1st percentile
    pub total_results: usize,
}

pub fn price_stats(cars: &[Car]) -> PriceStats {
    if cars.is_empty() {
        return PriceStats::default();
    }

    let mut prices: Vec<i64> = cars.iter().map(|car| car.price).collect();
    prices.sort_unstable();

    // Widened so extreme listing prices cannot overflow the sum
    let sum: i128 = prices.iter().map(|&price| i128::from(price)).sum();
    let average = sum as f64 / prices.len() as f64;
    let percentile_index = prices.len() / 100;

    PriceStats {
        average,
        best_price: prices[percentile_index],
        total_results: prices.len(),
    }
}

// The `n` cheapest cars, lowest price first; ties keep their original order
pub fn cheapest(cars: &[Car], n: usize) -> Vec<Car> {
    let mut sorted = cars.to_vec();
    sorted.sort_by_key(|car| car.price);
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketScan {
    pub stats: PriceStats,
    pub best_deals: Vec<Car>,
    pub record: Option<SearchRecord>, // None when no user is signed in
}

/// Searches the first page for `filters`, summarizes prices and records the
/// search in the user's history.
pub async fn scan_market(
    client: &AutoyardClient,
    history: &mut SearchHistory,
    filters: SearchFilters,
) -> Result<MarketScan, ApiError> {
    let page = client.search("", &filters, 1).await?;
    let stats = price_stats(&page.cars);
    let best_deals = cheapest(&page.cars, SCAN_KEEP);
    tracing::info!(
        total_results = stats.total_results,
        best_price = stats.best_price,
        "Market scan complete"
    );

    let record = history.user_id().map(|user_id| {
        SearchRecord::new(user_id, filters, best_deals.len() as u64)
    });
    if let Some(record) = &record {
        history.add_search(record.clone());
    }

    Ok(MarketScan { stats, best_deals, record })
}
