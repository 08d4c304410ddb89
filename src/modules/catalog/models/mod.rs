mod customer;
mod product;
mod subsidiary;

pub use customer::Customer;
pub use product::Product;
pub use subsidiary::Subsidiary;
