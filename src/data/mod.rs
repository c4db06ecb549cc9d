pub mod bar;
pub mod loader;
pub mod series;
pub mod yahoo;

pub use bar::{Bar, BarError};
pub use loader::{load_csv, save_csv};
pub use series::PriceSeries;
pub use yahoo::YahooClient;
