mod order;
mod payment;
mod plan;
mod product;
mod profile;
mod subscription;

pub use order::*;
pub use payment::*;
pub use plan::*;
pub use product::*;
pub use profile::*;
pub use subscription::*;
