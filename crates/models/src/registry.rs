use common::{EngineError, ForecastModel, ForecastOutput, Result, RunConfig};
use tracing::{debug, warn};

use crate::arima::AutoArimaModel;
use crate::average::{HistoricAverageModel, WindowAverageModel};
use crate::croston::CrostonClassicModel;
use crate::ets::AutoEtsModel;
use crate::hw::HoltWintersModel;
use crate::naive::NaiveModel;
use crate::seasonal_naive::SeasonalNaiveModel;
use crate::theta::DynamicThetaModel;

/// Names accepted in the configuration, in the order they are documented.
pub const MODEL_NAMES: [&str; 9] = [
    "Croston",
    "Historic Average",
    "HoltWinters",
    "SeasonalNaive",
    "DynamicOptimisedTheta",
    "AutoETS",
    "AutoArima",
    "Naive",
    "Window Average",
];

/// A configured forecasting procedure from the closed set of supported models.
pub enum ModelHandle {
    Croston(CrostonClassicModel),
    HistoricAverage(HistoricAverageModel),
    HoltWinters(HoltWintersModel),
    SeasonalNaive(SeasonalNaiveModel),
    DynamicOptimizedTheta(DynamicThetaModel),
    AutoEts(AutoEtsModel),
    AutoArima(AutoArimaModel),
    Naive(NaiveModel),
    WindowAverage(WindowAverageModel),
}

impl ModelHandle {
    /// Resolve a configuration name. Names are trimmed and matched exactly.
    pub fn from_name(name: &str, config: &RunConfig) -> Result<Self> {
        let m = config.season_length();
        let handle = match name.trim() {
            "Croston" => ModelHandle::Croston(CrostonClassicModel),
            "Historic Average" => ModelHandle::HistoricAverage(HistoricAverageModel),
            "HoltWinters" => ModelHandle::HoltWinters(HoltWintersModel::new(1)),
            "SeasonalNaive" => ModelHandle::SeasonalNaive(SeasonalNaiveModel::new(m)),
            "DynamicOptimisedTheta" => ModelHandle::DynamicOptimizedTheta(DynamicThetaModel::new(m)),
            "AutoETS" => ModelHandle::AutoEts(AutoEtsModel),
            "AutoArima" => ModelHandle::AutoArima(AutoArimaModel),
            "Naive" => ModelHandle::Naive(NaiveModel::new()),
            "Window Average" => {
                ModelHandle::WindowAverage(WindowAverageModel::new(config.window_size()))
            }
            other => {
                return Err(EngineError::ConfigError(format!(
                    "unknown model '{other}' (expected one of: {})",
                    MODEL_NAMES.join(", ")
                )))
            }
        };
        Ok(handle)
    }

    fn inner(&self) -> &dyn ForecastModel {
        match self {
            ModelHandle::Croston(m) => m,
            ModelHandle::HistoricAverage(m) => m,
            ModelHandle::HoltWinters(m) => m,
            ModelHandle::SeasonalNaive(m) => m,
            ModelHandle::DynamicOptimizedTheta(m) => m,
            ModelHandle::AutoEts(m) => m,
            ModelHandle::AutoArima(m) => m,
            ModelHandle::Naive(m) => m,
            ModelHandle::WindowAverage(m) => m,
        }
    }

    /// Column label of this model in forecast output.
    pub fn alias(&self) -> &str {
        self.inner().name()
    }

    /// Forecast `horizon` periods after each of `n_windows` rolling cutoffs.
    ///
    /// Window `i` (oldest first) trains on everything before the last
    /// `(n_windows - i) * step_size` periods, shifted so the newest window's
    /// evaluation span ends at the last observation.
    pub fn cross_validate(
        &self,
        values: &[f64],
        horizon: usize,
        step_size: usize,
        n_windows: usize,
        level: Option<u8>,
    ) -> Vec<WindowForecast> {
        rolling_train_lengths(values.len(), horizon, step_size, n_windows)
            .into_iter()
            .map(|train_len| WindowForecast {
                train_len,
                result: self.fit_predict(&values[..train_len], horizon, level),
            })
            .collect()
    }
}

impl ForecastModel for ModelHandle {
    fn name(&self) -> &str {
        self.alias()
    }

    fn has_intervals(&self) -> bool {
        self.inner().has_intervals()
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        let level = level.filter(|_| self.has_intervals());
        let output = self.inner().fit_predict(values, horizon, level)?;
        if output.mean.len() != horizon {
            return Err(EngineError::ModelError(format!(
                "{} returned {} points for horizon {}",
                self.alias(),
                output.mean.len(),
                horizon
            )));
        }
        if !output.is_finite() {
            return Err(EngineError::ModelError(format!(
                "{} produced a non-finite forecast",
                self.alias()
            )));
        }
        Ok(output)
    }
}

/// Forecast for one backtest window.
#[derive(Debug)]
pub struct WindowForecast {
    /// Number of leading observations the model was trained on.
    pub train_len: usize,
    pub result: Result<ForecastOutput>,
}

/// Training lengths of the rolling-origin windows, oldest first.
pub fn rolling_train_lengths(
    len: usize,
    horizon: usize,
    step_size: usize,
    n_windows: usize,
) -> Vec<usize> {
    (0..n_windows)
        .filter_map(|i| {
            let offset = (n_windows - 1 - i) * step_size + horizon;
            len.checked_sub(offset).filter(|&train| train > 0)
        })
        .collect()
}

/// Every model a run needs, resolved before any forecasting work.
pub struct ModelSet {
    pub candidates: Vec<ModelHandle>,
    pub baseline: ModelHandle,
    pub fallback: Option<ModelHandle>,
}

impl ModelSet {
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let mut candidates: Vec<ModelHandle> = Vec::with_capacity(config.forecast_models.len());
        for name in &config.forecast_models {
            let handle = ModelHandle::from_name(name, config)?;
            if candidates.iter().any(|c| c.alias() == handle.alias()) {
                warn!(model = %name, "Duplicate forecasting model ignored");
                continue;
            }
            candidates.push(handle);
        }

        let baseline = ModelHandle::from_name(&config.baseline_model, config)?;
        let fallback = config
            .fallback_model
            .as_deref()
            .map(|name| ModelHandle::from_name(name, config))
            .transpose()?;

        debug!(
            candidates = ?candidates.iter().map(ModelHandle::alias).collect::<Vec<_>>(),
            baseline = baseline.alias(),
            fallback = ?fallback.as_ref().map(ModelHandle::alias),
            "Resolved models"
        );

        Ok(Self {
            candidates,
            baseline,
            fallback,
        })
    }

    pub fn candidate_aliases(&self) -> Vec<&str> {
        self.candidates.iter().map(ModelHandle::alias).collect()
    }
}
