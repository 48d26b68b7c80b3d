use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::domain::product::ProductId;
use crate::domain::weather::WeatherCategory;

const HOT: &[u32] = &[
    91, 92, 93, 94, 95, 96, 97, 98, 99, 101, 102, 103, 104, 105, 910, 911, 912, 913, 914, 915,
    916, 917, 918, 919, 920, 921, 922, 923, 924, 925,
];
const MODERATE: &[u32] = &[
    104, 105, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 201, 202, 203, 926, 927, 928,
    929, 930, 931, 932, 933, 934, 935, 936, 937, 938, 939, 940,
];
const COLD: &[u32] = &[
    116, 117, 118, 119, 120, 301, 302, 305, 401, 402, 407, 941, 942, 943, 944, 945, 946, 947, 948,
    949, 950,
];
const RAIN: &[u32] = &[
    301, 302, 401, 951, 952, 953, 954, 955, 956, 957, 958, 959, 960, 961, 962, 963, 964, 965,
];
const SNOW: &[u32] = &[402, 407, 966, 967, 968, 969, 970, 971, 972, 973, 974, 975, 976];
const WINDY: &[u32] = &[
    305, 977, 978, 979, 980, 981, 982, 983, 984, 985, 986, 987, 988, 989, 990, 991, 992, 993,
];

const TABLE: [(WeatherCategory, &[u32]); 6] = [
    (WeatherCategory::Hot, HOT),
    (WeatherCategory::Moderate, MODERATE),
    (WeatherCategory::Cold, COLD),
    (WeatherCategory::Rain, RAIN),
    (WeatherCategory::Snow, SNOW),
    (WeatherCategory::Windy, WINDY),
];

/// Many-to-many mapping between weather categories and product ids.
///
/// Built once from the hand-authored table and never mutated. Ids absent
/// from the table have no categories here; [`WeatherIndex::suitable_categories`]
/// applies the `moderate` default where a product is assembled.
#[derive(Clone, Debug, Default)]
pub struct WeatherIndex {
    by_category: BTreeMap<WeatherCategory, BTreeSet<ProductId>>,
    by_product: BTreeMap<ProductId, BTreeSet<WeatherCategory>>,
}

impl WeatherIndex {
    pub fn from_table<'a, I>(table: I) -> Self
    where
        I: IntoIterator<Item = (WeatherCategory, &'a [u32])>,
    {
        let mut index = Self::default();
        for (category, ids) in table {
            let products = index.by_category.entry(category).or_default();
            for id in ids {
                let product_id = ProductId(*id);
                products.insert(product_id);
                index.by_product.entry(product_id).or_default().insert(category);
            }
        }
        index
    }

    /// The process-wide index built from the storefront's table.
    pub fn shared() -> &'static WeatherIndex {
        static INDEX: OnceLock<WeatherIndex> = OnceLock::new();
        INDEX.get_or_init(|| WeatherIndex::from_table(TABLE))
    }

    pub fn products_for(&self, category: WeatherCategory) -> BTreeSet<ProductId> {
        self.by_category.get(&category).cloned().unwrap_or_default()
    }

    pub fn categories_for(&self, product_id: ProductId) -> BTreeSet<WeatherCategory> {
        self.by_product.get(&product_id).cloned().unwrap_or_default()
    }

    pub fn suitable_categories(&self, product_id: ProductId) -> BTreeSet<WeatherCategory> {
        let categories = self.categories_for(product_id);
        if categories.is_empty() {
            BTreeSet::from([WeatherCategory::Moderate])
        } else {
            categories
        }
    }
}
