//! `fishlog-forecast` - external lookups for the fishing log
//!
//! Thin clients for the services a trip plan consults: tide736.net for the
//! day's tide curve, Open-Meteo for hourly weather and sea-surface
//! temperature, and Cloudinary for hosting catch photos. Each service sits
//! behind an async trait so callers can swap in fakes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod error;
mod http;
pub mod images;
pub mod marine;
pub mod tide;
pub mod weather;

pub use error::{Error, Result};
pub use http::HttpSettings;
pub use images::{public_id, CloudinaryHost, ImageHost};
pub use marine::{OpenMeteoMarineClient, SeaTempSource};
pub use tide::{chart_image_url, Tide736Client, TideDay, TideEvent, TidePort, TideSample, TideSource};
pub use weather::{
    every_3_hours, weather_code_label, wind_dir_arrow, OpenMeteoClient, WeatherHour, WeatherSource,
    WindLevel,
};
