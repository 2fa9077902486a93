mod driver;
mod literals;
mod metadata;
mod types;

pub use driver::ClickHousePlugin;
