pub mod data_product;
pub mod domain;
pub mod policy;
pub mod role;
pub mod user;

pub use data_product::*;
pub use domain::*;
pub use policy::*;
pub use role::*;
pub use user::*;
