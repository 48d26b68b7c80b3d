use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wardrobe_core::domain::money::CurrencyPolicy;
use wardrobe_core::domain::product::{Availability, Product};
use wardrobe_core::domain::weather::{WeatherCategory, WeatherObservation};
use wardrobe_core::filter::{self, AppliedFilter, Facet, FilterCriteria, PriceBucket, SortKey};
use wardrobe_core::recommend::{
    weather_unavailable_message, Recommendations, WeatherError, DEFAULT_RECOMMENDATION_LIMIT,
};

use super::{ApiError, ApiState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub count: Option<usize>,
    pub q: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub fabric: Option<String>,
    pub price_range: Option<String>,
    pub availability: Option<String>,
    pub sort: Option<String>,
    pub weather: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

impl CatalogQuery {
    fn criteria(&self) -> Result<FilterCriteria, ApiError> {
        Ok(FilterCriteria {
            query: present(self.q.clone()),
            color: present(self.color.clone()),
            size: present(self.size.clone()),
            fabric: present(self.fabric.clone()),
            price_range: present(self.price_range.clone())
                .map(|value| value.parse::<PriceBucket>())
                .transpose()?,
            availability: present(self.availability.clone())
                .map(|value| value.parse::<Availability>())
                .transpose()?,
        })
    }

    fn sort_key(&self) -> Result<Option<SortKey>, ApiError> {
        Ok(present(self.sort.clone()).map(|value| value.parse::<SortKey>()).transpose()?)
    }

    fn weather(&self) -> Result<Option<WeatherCategory>, ApiError> {
        Ok(present(self.weather.clone()).map(|value| value.parse::<WeatherCategory>()).transpose()?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub fabrics: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub applied_filters: Vec<AppliedFilter>,
    pub filter_options: FilterOptions,
    pub currency: CurrencyPolicy,
}

/// Generates a fresh catalog page, optionally restricted to products suited
/// to one weather category, then filters and sorts it.
pub async fn catalog(
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>, ApiError> {
    let criteria = query.criteria()?;
    let sort = query.sort_key()?;
    let count = query.count.unwrap_or(state.page_size);

    let generated = match query.weather()? {
        Some(category) => state.catalog.generate_for_category(category, count).await,
        None => state.catalog.generate(count).await,
    };
    let filter_options = FilterOptions {
        colors: filter::filter_options(&generated, Facet::Color),
        sizes: filter::filter_options(&generated, Facet::Size),
        fabrics: filter::filter_options(&generated, Facet::Fabric),
    };
    let products = filter::apply(&generated, &criteria, sort, &state.price_bands);
    debug!(
        event_name = "api.catalog.generated",
        generated = generated.len(),
        shown = products.len(),
        "catalog page assembled"
    );

    Ok(Json(CatalogPage {
        total: products.len(),
        applied_filters: criteria.applied(&state.price_bands, &state.currency),
        products,
        filter_options,
        currency: state.currency.clone(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub city: Option<String>,
    pub temp: Option<f64>,
    pub condition: Option<String>,
    pub wind: Option<f64>,
    pub limit: Option<usize>,
}

/// With `temp` and `condition` the observation is taken as given; otherwise
/// the weather for `city` (or the configured default city) is looked up.
pub async fn recommendations(
    State(state): State<ApiState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Recommendations>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    let city = present(query.city).unwrap_or_else(|| state.default_city.clone());

    if let (Some(temperature), Some(condition)) = (query.temp, present(query.condition)) {
        let observation = WeatherObservation::new(temperature, condition, query.wind.unwrap_or(0.0));
        let ready = state.recommendations.for_observation(city, observation, limit).await;
        return Ok(Json(ready));
    }

    match state.recommendations.for_city(&city, limit).await {
        Ok(ready) => Ok(Json(ready)),
        Err(error) => {
            warn!(
                event_name = "api.recommendations.weather_failed",
                city = %city,
                error = %error,
                "weather lookup failed"
            );
            let message = weather_unavailable_message(&city);
            Err(match error {
                WeatherError::UnknownCity(_) => ApiError::NotFound(message),
                _ => ApiError::Unavailable(message),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::Value;

    use crate::api::test_support::{call, seeded_app};

    fn prices(body: &Value) -> Vec<f64> {
        body["products"]
            .as_array()
            .expect("products")
            .iter()
            .map(|product| {
                product["price"].as_str().expect("price").parse::<f64>().expect("decimal price")
            })
            .collect()
    }

    #[tokio::test]
    async fn catalog_respects_count_and_sort() {
        let app = seeded_app().await;

        let (status, body) = call(&app, Method::GET, "/api/catalog?count=12&sort=priceLow", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 12);

        let prices = prices(&body);
        assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]), "prices {prices:?}");
    }

    #[tokio::test]
    async fn catalog_filters_and_lists_applied_tags() {
        let app = seeded_app().await;

        let (status, body) =
            call(&app, Method::GET, "/api/catalog?count=200&availability=Out%20of%20Stock", None).await;
        assert_eq!(status, StatusCode::OK);
        let products = body["products"].as_array().expect("products");
        assert!(!products.is_empty());
        assert!(products.iter().all(|product| product["availability"] == "Out of Stock"));
        assert_eq!(body["appliedFilters"][0]["name"], "availability");
    }

    #[tokio::test]
    async fn weather_restricts_to_suitable_products() {
        let app = seeded_app().await;

        let (_, body) = call(&app, Method::GET, "/api/catalog?count=50&weather=rain", None).await;
        let products = body["products"].as_array().expect("products");
        assert!(!products.is_empty());
        assert!(products.iter().all(|product| {
            product["weather"].as_array().is_some_and(|tags| tags.iter().any(|tag| tag == "rain"))
        }));
    }

    #[tokio::test]
    async fn bad_labels_are_bad_requests() {
        let app = seeded_app().await;
        for uri in ["/api/catalog?sort=cheapest", "/api/catalog?priceRange=free", "/api/catalog?weather=foggy"] {
            let (status, _) = call(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn recommendations_from_observation_and_city() {
        let app = seeded_app().await;

        let (status, body) =
            call(&app, Method::GET, "/api/recommendations?temp=31&condition=clear&limit=4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "hot");
        assert!(body["products"].as_array().is_some_and(|products| products.len() <= 4));

        let (status, body) = call(&app, Method::GET, "/api/recommendations?city=Bergen", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "rain");
        assert_eq!(body["title"], "Rainy Weather");

        let (status, body) = call(&app, Method::GET, "/api/recommendations?city=Atlantis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Could not fetch weather for Atlantis. Please try another city.");

        let (status, body) = call(&app, Method::GET, "/api/recommendations", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Could not fetch weather for London. Please try another city.");
    }
}
