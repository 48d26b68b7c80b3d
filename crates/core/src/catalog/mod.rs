//! In-memory product catalog.
//!
//! Each call to [`CatalogGenerator::generate`] draws a fresh sample of
//! identifiers from [`pool::PRODUCT_POOL`] and assembles products, preferring
//! persisted attributes where the dataset has them. The dataset is fetched
//! from the [`ProductSource`] once per generator and cached; a failed fetch
//! leaves every product fully synthetic instead of failing generation.

pub mod dataset;
pub mod pool;

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::money::Money;
use crate::domain::product::{Availability, Fit, Product, ProductId};
use crate::domain::weather::WeatherCategory;
use crate::weather::WeatherIndex;

pub use dataset::{DatasetRow, PersistedDataset, ProductRecord};

pub const DEFAULT_PAGE_SIZE: usize = 20;

const SYNTHETIC_PRICE_MIN_CENTS: i64 = 1_500;
const SYNTHETIC_PRICE_MAX_CENTS: i64 = 4_500;
const SYNTHETIC_RATING_MIN_TENTHS: i64 = 30;
const SYNTHETIC_RATING_MAX_TENTHS: i64 = 50;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("product source returned malformed data: {0}")]
    Malformed(String),
    #[error("product {0} was not found")]
    NotFound(ProductId),
}

/// Where the persisted product dataset comes from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError>;
}

#[async_trait]
impl<T> ProductSource for Arc<T>
where
    T: ProductSource + ?Sized,
{
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        (**self).fetch_all().await
    }
}

/// A fixed set of records, mostly for tests and offline tooling.
#[derive(Clone, Debug, Default)]
pub struct StaticProductSource {
    records: Vec<ProductRecord>,
}

impl StaticProductSource {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ProductSource for StaticProductSource {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        Ok(self.records.clone())
    }
}

pub struct CatalogGenerator<S> {
    source: S,
    index: WeatherIndex,
    pool: Vec<ProductId>,
    dataset: OnceCell<PersistedDataset>,
}

impl<S> CatalogGenerator<S>
where
    S: ProductSource,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            index: WeatherIndex::shared().clone(),
            pool: pool::PRODUCT_POOL.iter().copied().map(ProductId).collect(),
            dataset: OnceCell::new(),
        }
    }

    pub fn with_index(mut self, index: WeatherIndex) -> Self {
        self.index = index;
        self
    }

    pub fn with_pool(mut self, pool: Vec<ProductId>) -> Self {
        self.pool = pool;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// The persisted dataset, fetched on first use.
    pub async fn dataset(&self) -> &PersistedDataset {
        self.dataset
            .get_or_init(|| async {
                match self.source.fetch_all().await {
                    Ok(records) => {
                        let dataset = PersistedDataset::from_records(records);
                        info!(
                            event_name = "catalog.dataset.loaded",
                            record_count = dataset.len(),
                            "persisted product dataset cached"
                        );
                        dataset
                    }
                    Err(error) => {
                        warn!(
                            event_name = "catalog.dataset.unavailable",
                            error = %error,
                            "product dataset fetch failed; catalog will be fully synthetic"
                        );
                        PersistedDataset::default()
                    }
                }
            })
            .await
    }

    /// Draws up to `count` distinct products. Requests beyond the pool size
    /// are truncated to the pool size.
    pub async fn generate(&self, count: usize) -> Vec<Product> {
        let dataset = self.dataset().await;
        let mut rng = rand::thread_rng();
        synthesize(&self.pool, dataset, &self.index, count, &mut rng)
    }

    /// Like [`generate`](Self::generate) but only samples products suitable
    /// for `category`.
    pub async fn generate_for_category(
        &self,
        category: WeatherCategory,
        count: usize,
    ) -> Vec<Product> {
        let candidates: Vec<ProductId> = self
            .pool
            .iter()
            .copied()
            .filter(|id| self.index.suitable_categories(*id).contains(&category))
            .collect();
        let dataset = self.dataset().await;
        let mut rng = rand::thread_rng();
        synthesize(&candidates, dataset, &self.index, count, &mut rng)
    }

    /// Assembles a single product by id, for detail views. Synthetic fields
    /// are drawn fresh on each call.
    pub async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        if !self.pool.contains(&product_id) {
            return Err(CatalogError::NotFound(product_id));
        }
        let dataset = self.dataset().await;
        let mut rng = rand::thread_rng();
        Ok(build_product(product_id, dataset.get(product_id), &self.index, &mut rng))
    }
}

/// Samples without replacement from `pool` and builds one product per id.
pub fn synthesize<R>(
    pool: &[ProductId],
    dataset: &PersistedDataset,
    index: &WeatherIndex,
    count: usize,
    rng: &mut R,
) -> Vec<Product>
where
    R: Rng + ?Sized,
{
    let sampled: Vec<ProductId> = pool.choose_multiple(rng, count).copied().collect();
    sampled.into_iter().map(|id| build_product(id, dataset.get(id), index, rng)).collect()
}

fn build_product<R>(
    id: ProductId,
    record: Option<&ProductRecord>,
    index: &WeatherIndex,
    rng: &mut R,
) -> Product
where
    R: Rng + ?Sized,
{
    let fit = record.and_then(|record| record.fit).unwrap_or_else(|| random_fit(rng));
    let color =
        record.and_then(|record| record.color.clone()).unwrap_or_else(|| random_color(rng));
    let name = record
        .and_then(|record| record.name.clone())
        .unwrap_or_else(|| format!("{fit} {color} T-Shirt {id}"));
    let price = record.and_then(|record| record.price).unwrap_or_else(|| synthetic_price(rng));
    let rating = record.and_then(|record| record.rating).unwrap_or_else(|| synthetic_rating(rng));

    Product {
        id,
        name,
        category: record
            .and_then(|record| record.category.clone())
            .unwrap_or_else(|| Product::DEFAULT_CATEGORY.to_string()),
        fit,
        color,
        price,
        rating,
        availability: record
            .and_then(|record| record.availability)
            .unwrap_or(Availability::InStock),
        size: record.and_then(|record| record.size.clone()),
        fabric: record.and_then(|record| record.fabric.clone()),
        description: record.and_then(|record| record.description.clone()),
        keywords: record.and_then(|record| record.keywords.clone()),
        image: Product::image_path(id),
        weather: index.suitable_categories(id),
    }
}

fn random_fit<R: Rng + ?Sized>(rng: &mut R) -> Fit {
    Fit::ALL[rng.gen_range(0..Fit::ALL.len())]
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    pool::COLOR_PALETTE[rng.gen_range(0..pool::COLOR_PALETTE.len())].to_string()
}

fn synthetic_price<R: Rng + ?Sized>(rng: &mut R) -> Money {
    Money::from_minor_units(rng.gen_range(SYNTHETIC_PRICE_MIN_CENTS..SYNTHETIC_PRICE_MAX_CENTS))
}

fn synthetic_rating<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(SYNTHETIC_RATING_MIN_TENTHS..=SYNTHETIC_RATING_MAX_TENTHS), 1)
}
