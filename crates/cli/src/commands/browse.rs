use clap::Args;
use serde_json::json;

use crate::commands::{prepare, CommandResult};
use wardrobe_core::catalog::CatalogGenerator;
use wardrobe_core::domain::product::Availability;
use wardrobe_core::domain::weather::WeatherCategory;
use wardrobe_core::errors::DomainError;
use wardrobe_core::filter::{self, FilterCriteria, PriceBucket, SortKey};
use wardrobe_db::repositories::SqlProductRepository;
use wardrobe_db::{connect_with_config, migrations};

#[derive(Debug, Clone, Default, Args)]
pub struct BrowseArgs {
    #[arg(long, help = "Products to generate before filtering (defaults to catalog.page_size)")]
    pub count: Option<usize>,
    #[arg(long, help = "Case-insensitive search over name, description and keywords")]
    pub query: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub fabric: Option<String>,
    #[arg(long, help = "under20, 20to30, 30to40 or over40")]
    pub price_range: Option<String>,
    #[arg(long, help = "\"In Stock\" or \"Out of Stock\"")]
    pub availability: Option<String>,
    #[arg(long, help = "priceLow, priceHigh, rating or name")]
    pub sort: Option<String>,
    #[arg(long, help = "Only products suited to a weather category (hot, cold, rain, ...)")]
    pub weather: Option<String>,
}

struct BrowsePlan {
    criteria: FilterCriteria,
    sort: Option<SortKey>,
    weather: Option<WeatherCategory>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

impl BrowseArgs {
    fn plan(&self) -> Result<BrowsePlan, DomainError> {
        let criteria = FilterCriteria {
            query: present(&self.query),
            color: present(&self.color),
            size: present(&self.size),
            fabric: present(&self.fabric),
            price_range: present(&self.price_range)
                .map(|value| value.parse::<PriceBucket>())
                .transpose()?,
            availability: present(&self.availability)
                .map(|value| value.parse::<Availability>())
                .transpose()?,
        };
        Ok(BrowsePlan {
            criteria,
            sort: present(&self.sort).map(|value| value.parse::<SortKey>()).transpose()?,
            weather: present(&self.weather)
                .map(|value| value.parse::<WeatherCategory>())
                .transpose()?,
        })
    }
}

pub fn run(args: &BrowseArgs) -> CommandResult {
    let plan = match args.plan() {
        Ok(plan) => plan,
        Err(error) => return CommandResult::failure("browse", "invalid_filter", error.to_string(), 2),
    };
    let (config, runtime) = match prepare("browse") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };
    let count = args.count.unwrap_or(config.catalog.page_size);

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let generator = CatalogGenerator::new(SqlProductRepository::new(pool.clone()));
        let generated = match plan.weather {
            Some(category) => generator.generate_for_category(category, count).await,
            None => generator.generate(count).await,
        };
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(generated)
    });

    let generated = match result {
        Ok(generated) => generated,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("browse", error_class, message, exit_code);
        }
    };

    let bands = &config.catalog.price_bands;
    let products = filter::apply(&generated, &plan.criteria, plan.sort, bands);
    let applied = plan
        .criteria
        .applied(bands, &config.currency)
        .into_iter()
        .map(|filter| filter.label)
        .collect::<Vec<_>>();

    CommandResult::success_with_data(
        "browse",
        format!("showing {} of {} generated products", products.len(), generated.len()),
        Some(json!({
            "generated": generated.len(),
            "applied_filters": applied,
            "products": products,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::BrowseArgs;
    use wardrobe_core::filter::{PriceBucket, SortKey};

    #[test]
    fn blank_flags_are_ignored() {
        let args = BrowseArgs {
            color: Some("  ".to_string()),
            sort: Some(String::new()),
            ..BrowseArgs::default()
        };
        let plan = args.plan().expect("plan");

        assert!(plan.criteria.is_empty());
        assert!(plan.sort.is_none());
    }

    #[test]
    fn labels_parse_into_criteria() {
        let args = BrowseArgs {
            color: Some("Black".to_string()),
            price_range: Some("under20".to_string()),
            sort: Some("priceLow".to_string()),
            ..BrowseArgs::default()
        };
        let plan = args.plan().expect("plan");

        assert_eq!(plan.criteria.color.as_deref(), Some("Black"));
        assert_eq!(plan.criteria.price_range, Some(PriceBucket::Under));
        assert_eq!(plan.sort, Some(SortKey::PriceAsc));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let args = BrowseArgs { weather: Some("foggy".to_string()), ..BrowseArgs::default() };
        assert!(args.plan().is_err());
    }
}
