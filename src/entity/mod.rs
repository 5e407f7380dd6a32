pub mod fulfillment_events;
pub mod listings;
pub mod orders;
pub mod seller_profiles;
pub mod shipping_labels;
pub mod shipping_options;
pub mod shipping_providers;

pub use fulfillment_events::Entity as FulfillmentEvents;
pub use listings::Entity as Listings;
pub use orders::Entity as Orders;
pub use seller_profiles::Entity as SellerProfiles;
pub use shipping_labels::Entity as ShippingLabels;
pub use shipping_options::Entity as ShippingOptions;
pub use shipping_providers::Entity as ShippingProviders;
