mod driver;
mod metadata;

pub use driver::MySqlPlugin;
