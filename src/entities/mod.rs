pub mod prelude;

pub mod search_history;
pub mod users;
pub mod weather_cache;
