//! Forecasting models and the registry that maps configuration names to them.

mod arima;
mod average;
mod croston;
mod ets;
mod hw;
mod intervals;
mod naive;
mod optim;
mod registry;
mod seasonal_naive;
mod theta;

pub use arima::AutoArimaModel;
pub use average::{HistoricAverageModel, WindowAverageModel};
pub use croston::CrostonClassicModel;
pub use ets::AutoEtsModel;
pub use hw::HoltWintersModel;
pub use naive::NaiveModel;
pub use registry::{rolling_train_lengths, ModelHandle, ModelSet, WindowForecast, MODEL_NAMES};
pub use seasonal_naive::SeasonalNaiveModel;
pub use theta::DynamicThetaModel;
