pub mod indicator;
pub mod price_bar;
pub mod series;

pub use indicator::{IndicatorOutput, IndicatorRequest, IndicatorSnapshot, IndicatorSpec};
pub use price_bar::PriceBar;
pub use series::{Series, SeriesPoint};
