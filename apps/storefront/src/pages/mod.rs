// apps/storefront/src/pages/mod.rs

//! Page-session objects. Each one gates on identity, loads its slice of
//! state and answers the actions its page offers.

pub mod checkout;
pub mod orders;
pub mod payment;
pub mod profile;
pub mod storefront;

pub use checkout::{CheckoutPage, CheckoutView, PlacedOrder};
pub use orders::{OrderTab, OrdersPage, OrdersView, RatingForm};
pub use payment::{PaymentInstruction, PaymentPage};
pub use profile::{ProfilePage, ProfileView};
pub use storefront::{CartView, ProductListing, StorefrontPage};
