pub mod weather;

pub use weather::{LookupError, WeatherReport, WeatherService};
