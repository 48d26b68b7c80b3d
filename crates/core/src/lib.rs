pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod recommend;
pub mod session;
pub mod validation;
pub mod weather;
pub mod wire;

pub use cart::{CartMutator, CartStore, LocalMirror, MutationOutcome, StoreError, WishlistStore};
pub use catalog::{
    CatalogError, CatalogGenerator, DatasetRow, PersistedDataset, ProductRecord, ProductSource,
    StaticProductSource,
};
pub use checkout::{OrderLine, OrderSummary, ShippingMethod};
pub use domain::cart::{CartLine, UserId, WishlistLine};
pub use domain::money::{CurrencyPolicy, Money};
pub use domain::product::{Availability, Fit, Product, ProductId};
pub use domain::weather::{WeatherCategory, WeatherObservation};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use filter::{FilterCriteria, PriceBands, PriceBucket, SortKey};
pub use recommend::{RecommendationOutcome, RecommendationService, WeatherError, WeatherProvider};
pub use session::{Session, SessionContext};
pub use weather::{classify, WeatherIndex};
