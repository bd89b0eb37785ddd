//! Valuation engine: replays a portfolio across dates and scenarios.
//!
//! # Loop structure
//!
//! ```text
//! init calculators, per-trade state and T0 values
//! for sample in 0..samples:
//!     reset trades
//!     for date in grid:
//!         close-out date?  advance scenario, recalibrate, run trade and
//!                          counterparty calculators
//!         valuation date?  advance market, recalibrate, run trade and
//!                          counterparty calculators
//!     reset fixings
//! dry-run fill, zero errored trades
//! ```
//!
//! Close-out results share the cube date index of the most recent valuation
//! date. When a grid slot is both a close-out and a valuation date the
//! close-out runs first and the scenario is applied once.
//!
//! A failing trade is recorded as a [`StructuredTradeError`], skipped for
//! the rest of the build and zeroed in the cube at the end. Everything else
//! aborts the build with a [`ValuationError`].
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::{Date, DateGrid};
//! use pricer_simulation::cube::DoublePrecisionCube;
//! use pricer_simulation::error::CalculationError;
//! use pricer_simulation::market::{FixingManager, MarketError, SharedMarket, SimMarket};
//! use pricer_simulation::portfolio::{CounterpartyId, Portfolio, Trade, TradeId};
//! use pricer_simulation::{
//!     BuildOptions, CubeOutputs, NpvCalculator, NpvCube, ValuationCalculator, ValuationEngine,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! struct NoFixings;
//! impl FixingManager for NoFixings {
//!     fn initialise(&mut self, _: &Portfolio, _: Date) -> Result<(), MarketError> { Ok(()) }
//!     fn reset(&mut self) {}
//! }
//!
//! struct Flat { asof: Date, fixings: NoFixings }
//! impl SimMarket for Flat {
//!     fn asof_date(&self) -> Date { self.asof }
//!     fn label(&self) -> &str { "flat" }
//!     fn pre_update(&mut self) {}
//!     fn update_date(&mut self, d: Date) -> Result<(), MarketError> { self.asof = d; Ok(()) }
//!     fn update_scenario(&mut self, _: Date) -> Result<(), MarketError> { Ok(()) }
//!     fn post_update(&mut self, _: Date, _: bool) -> Result<(), MarketError> { Ok(()) }
//!     fn update_aggregation_scenario_data(&mut self, _: Date) -> Result<(), MarketError> { Ok(()) }
//!     fn reset(&mut self) {}
//!     fn fixing_manager_mut(&mut self) -> &mut dyn FixingManager { &mut self.fixings }
//! }
//!
//! struct Cash(CounterpartyId);
//! impl Trade for Cash {
//!     fn trade_type(&self) -> &str { "Cash" }
//!     fn npv_currency(&self) -> &str { "EUR" }
//!     fn counterparty(&self) -> &CounterpartyId { &self.0 }
//!     fn npv(&self, _: &dyn SimMarket) -> Result<f64, CalculationError> { Ok(100.0) }
//! }
//!
//! let today = Date::from_ymd(2024, 1, 2).unwrap();
//! let grid = DateGrid::new(vec![
//!     Date::from_ymd(2024, 4, 2).unwrap(),
//!     Date::from_ymd(2024, 7, 2).unwrap(),
//! ])
//! .unwrap();
//! let market: SharedMarket = Arc::new(Mutex::new(Flat { asof: today, fixings: NoFixings }));
//!
//! let mut portfolio = Portfolio::new();
//! portfolio
//!     .add(TradeId::new("C1"), Box::new(Cash(CounterpartyId::new("BANK"))))
//!     .unwrap();
//!
//! let mut cube =
//!     DoublePrecisionCube::new(today, ["C1"], grid.valuation_dates(), 5, 1).unwrap();
//! let mut calculators: Vec<Box<dyn ValuationCalculator>> =
//!     vec![Box::new(NpvCalculator::new("EUR", 0))];
//!
//! let mut engine = ValuationEngine::builder(today, grid).market(market).build().unwrap();
//! let report = engine
//!     .build_cube(
//!         &mut portfolio,
//!         CubeOutputs::new(&mut cube),
//!         &mut calculators,
//!         None,
//!         BuildOptions::default(),
//!     )
//!     .unwrap();
//!
//! assert!(report.is_clean());
//! assert_eq!(cube.get(0, 1, 4, 0).unwrap(), 100.0);
//! ```

mod checkout;
mod dry_run;
mod trade_errors;

pub use dry_run::{dry_run_noise, DRY_RUN_NOISE_SAMPLES};
pub use trade_errors::{StructuredTradeError, SCENARIO_VALUATION_STAGE};

use crate::calculator::{CounterpartyOutput, CubeOutputs, ValuationCalculator, ValuationPoint};
use crate::cube::NpvCube;
use crate::error::{CalculationError, ValuationError};
use crate::market::{SharedMarket, SimMarket};
use crate::model::{ModelBuilder, ModelBuilderSet};
use crate::observation::ObservationMode;
use crate::portfolio::{Portfolio, Trade, TradeId};
use crate::progress::{ProgressIndicator, ProgressReporter};
use checkout::MarketCheckout;
use pricer_core::types::{Date, DateGrid};
use std::sync::Arc;
use std::time::{Duration, Instant};
use trade_errors::TradeErrors;
use tracing::{debug, info, trace, warn};

/// Per-build switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Keep the valuation date of the preceding valuation date on close-out
    /// dates, advance only the scenario, and freeze exercise decisions.
    pub mpor_sticky_date: bool,
    /// Value sample 0 only and fill later samples from time-zero values.
    pub dry_run: bool,
}

impl BuildOptions {
    /// Sets sticky close-out dates.
    pub fn with_mpor_sticky_date(mut self, sticky: bool) -> Self {
        self.mpor_sticky_date = sticky;
        self
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Wall-clock time spent in each phase of a cube build.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseTimings {
    /// Market updates and model recalibration
    pub update: Duration,
    /// Calculator runs
    pub pricing: Duration,
    /// Fixing resets between samples
    pub fixing: Duration,
    /// Whole build
    pub total: Duration,
}

/// Outcome of a successful cube build.
#[derive(Clone, Debug, Default)]
pub struct CubeBuildReport {
    /// Trade errors in occurrence order
    pub errors: Vec<StructuredTradeError>,
    /// Trades whose cube entries were zeroed
    pub errored_trades: Vec<TradeId>,
    /// Samples valued by the engine (one in a dry run)
    pub samples_valued: usize,
    /// Phase timings
    pub timings: PhaseTimings,
}

impl CubeBuildReport {
    /// Whether no trade failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded for one trade.
    pub fn errors_for<'a>(
        &'a self,
        trade_id: &'a str,
    ) -> impl Iterator<Item = &'a StructuredTradeError> + 'a {
        self.errors.iter().filter(move |e| e.trade_id == trade_id)
    }
}

/// Builder for [`ValuationEngine`].
pub struct ValuationEngineBuilder {
    today: Date,
    grid: DateGrid,
    market: Option<SharedMarket>,
    model_builders: ModelBuilderSet,
    observation_mode: ObservationMode,
    progress: ProgressReporter,
}

impl ValuationEngineBuilder {
    /// Starts a builder for the given reference date and date grid.
    pub fn new(today: Date, grid: DateGrid) -> Self {
        Self {
            today,
            grid,
            market: None,
            model_builders: ModelBuilderSet::new(),
            observation_mode: ObservationMode::default(),
            progress: ProgressReporter::new(),
        }
    }

    /// Sets the scenario market.
    pub fn market(mut self, market: SharedMarket) -> Self {
        self.market = Some(market);
        self
    }

    /// Adds a model builder under `key`.
    pub fn model_builder(mut self, key: impl Into<String>, builder: Box<dyn ModelBuilder>) -> Self {
        self.model_builders.add(key, builder);
        self
    }

    /// Replaces all model builders.
    pub fn model_builders(mut self, builders: ModelBuilderSet) -> Self {
        self.model_builders = builders;
        self
    }

    /// Sets the observation mode.
    pub fn observation_mode(mut self, mode: ObservationMode) -> Self {
        self.observation_mode = mode;
        self
    }

    /// Registers a progress indicator.
    pub fn progress_indicator(mut self, indicator: Box<dyn ProgressIndicator>) -> Self {
        self.progress.register(indicator);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// - `ValuationError::EmptyDateGrid` if the grid has no dates
    /// - `ValuationError::TodayAfterGridStart` if today is after the first
    ///   grid date
    /// - `ValuationError::MissingMarket` if no market was set
    pub fn build(self) -> Result<ValuationEngine, ValuationError> {
        let first = *self
            .grid
            .dates()
            .first()
            .ok_or(ValuationError::EmptyDateGrid)?;
        if self.today > first {
            return Err(ValuationError::TodayAfterGridStart {
                today: self.today,
                first,
            });
        }
        let market = self.market.ok_or(ValuationError::MissingMarket)?;

        Ok(ValuationEngine {
            today: self.today,
            grid: self.grid,
            market,
            model_builders: self.model_builders,
            observation_mode: self.observation_mode,
            progress: self.progress,
        })
    }
}

/// Orchestrates the revaluation of a portfolio into NPV cubes.
pub struct ValuationEngine {
    today: Date,
    grid: DateGrid,
    market: SharedMarket,
    model_builders: ModelBuilderSet,
    observation_mode: ObservationMode,
    progress: ProgressReporter,
}

impl ValuationEngine {
    /// Starts a [`ValuationEngineBuilder`].
    pub fn builder(today: Date, grid: DateGrid) -> ValuationEngineBuilder {
        ValuationEngineBuilder::new(today, grid)
    }

    /// Reference date.
    pub fn today(&self) -> Date {
        self.today
    }

    /// Simulation date grid.
    pub fn date_grid(&self) -> &DateGrid {
        &self.grid
    }

    /// Observation mode in force.
    pub fn observation_mode(&self) -> ObservationMode {
        self.observation_mode
    }

    /// Shared scenario market.
    pub fn market(&self) -> &SharedMarket {
        &self.market
    }

    /// Registers a progress indicator.
    pub fn register_progress_indicator(&mut self, indicator: Box<dyn ProgressIndicator>) {
        self.progress.register(indicator);
    }

    /// Values `portfolio` for every grid date and sample.
    ///
    /// Trade `i` of the portfolio (in id order) is written to id `i` of the
    /// trade cube, and the cube must map each trade id to that index. The
    /// counterparty cube, if given, holds one id per counterparty plus a
    /// placeholder and one date per grid date. Counterparty calculators run
    /// on every grid date, close-out dates included.
    ///
    /// The scenario market is locked for the duration of the call and reset
    /// before it returns, whether or not the build succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`ValuationError`] for empty portfolios, cube dimension
    /// mismatches, cube ids that do not match the portfolio, trades without
    /// NPV currency, close-out dates ahead of every valuation date, and
    /// failures of shared state (market updates, model recalibration,
    /// counterparty calculators). Cube contents are unspecified after an
    /// error, except that dimension and id checks run before anything is
    /// written.
    pub fn build_cube(
        &mut self,
        portfolio: &mut Portfolio,
        mut outputs: CubeOutputs<'_>,
        calculators: &mut [Box<dyn ValuationCalculator>],
        mut counterparty: Option<CounterpartyOutput<'_>>,
        options: BuildOptions,
    ) -> Result<CubeBuildReport, ValuationError> {
        let shared = Arc::clone(&self.market);
        let mut market = MarketCheckout::acquire(&shared)?;

        info!(
            "Build cube with mpor_sticky_date={}, dry_run={}",
            options.mpor_sticky_date, options.dry_run
        );

        self.check_dimensions(
            portfolio,
            &*outputs.cube,
            counterparty.as_ref().map(|c| &*c.cube),
        )?;

        self.progress.reset();

        let samples = outputs.cube.samples();
        info!(
            "Starting valuation engine for {} trades, {} samples and {} dates",
            portfolio.len(),
            samples,
            self.grid.len()
        );

        let mode = self.observation_mode;
        let loop_start = Instant::now();
        let mut timings = PhaseTimings::default();

        info!("Initialise {} valuation calculators", calculators.len());
        for calc in calculators.iter_mut() {
            calc.init(portfolio, &*market);
            calc.init_scenario();
        }

        let counterparties: Vec<(String, usize)> = counterparty
            .as_ref()
            .map(|c| {
                c.cube
                    .ids_and_indexes()
                    .iter()
                    .map(|(name, index)| (name.clone(), *index))
                    .collect()
            })
            .unwrap_or_default();

        let mut errors = TradeErrors::new(portfolio.len());

        debug!("Initialise trade state");
        for (index, (id, trade)) in portfolio.trades_mut().enumerate() {
            if trade.npv_currency().is_empty() {
                return Err(ValuationError::MissingNpvCurrency(id.to_string()));
            }
            trace!("Initialise trade {}", id);
            trade.initialise(self.grid.dates());

            self.model_builders.recalibrate(mode)?;

            if let Err(e) = calculate_t0(&**trade, index, calculators, &*market, &mut outputs) {
                errors.record(
                    index,
                    StructuredTradeError::scenario_valuation(
                        id.as_str(),
                        trade.trade_type(),
                        format!("T0 valuation error: {}", e),
                    ),
                );
            }

            if mode.unregisters_floating_legs() {
                trade.unregister_floating_legs();
            }
        }
        info!("Total number of trades = {}", portfolio.len());

        let asof = market.asof_date();
        if self.grid.dates().first().is_some_and(|first| *first > asof) {
            market.fixing_manager_mut().initialise(portfolio, asof)?;
        }

        let samples_valued = if options.dry_run {
            samples.min(1)
        } else {
            samples
        };

        for sample in 0..samples_valued {
            trace!("Apply scenario sample #{}", sample);
            self.progress.update_progress(sample, samples, "");

            for (_, trade) in portfolio.trades_mut() {
                trade.reset();
            }

            let mut cube_date_index: Option<usize> = None;
            let flags = self
                .grid
                .is_valuation_date()
                .iter()
                .zip(self.grid.is_close_out_date());

            for (grid_index, (&date, (&is_valuation, &is_close_out))) in
                self.grid.dates().iter().zip(flags).enumerate()
            {
                let mut scenario_updated = false;

                if is_close_out {
                    let start = Instant::now();
                    market.pre_update();
                    if !options.mpor_sticky_date {
                        market.update_date(date)?;
                    }
                    market.update_scenario(date)?;
                    scenario_updated = true;
                    market.post_update(date, !options.mpor_sticky_date)?;
                    self.model_builders.recalibrate(mode)?;
                    timings.update += start.elapsed();

                    let start = Instant::now();
                    let date_index =
                        cube_date_index.ok_or(ValuationError::CloseOutBeforeValuationDate(date))?;
                    let point = ValuationPoint {
                        date,
                        grid_index,
                        date_index,
                        sample,
                        is_close_out: true,
                    };
                    if options.mpor_sticky_date {
                        set_exercisable(portfolio, false);
                    }
                    run_trade_calculators(
                        mode,
                        portfolio,
                        &mut errors,
                        calculators,
                        &*market,
                        &mut outputs,
                        &point,
                    );
                    if options.mpor_sticky_date {
                        set_exercisable(portfolio, true);
                    }
                    if let Some(output) = counterparty.as_mut() {
                        run_counterparty_calculators(&counterparties, output, &*market, &point)?;
                    }
                    timings.pricing += start.elapsed();
                }

                if is_valuation {
                    let start = Instant::now();
                    let date_index = cube_date_index.map_or(0, |i| i + 1);
                    cube_date_index = Some(date_index);

                    market.pre_update();
                    market.update_date(date)?;
                    if !scenario_updated {
                        market.update_scenario(date)?;
                    }
                    market.post_update(date, true)?;
                    market.update_aggregation_scenario_data(date)?;
                    self.model_builders.recalibrate(mode)?;
                    timings.update += start.elapsed();

                    let start = Instant::now();
                    let point = ValuationPoint {
                        date,
                        grid_index,
                        date_index,
                        sample,
                        is_close_out: false,
                    };
                    run_trade_calculators(
                        mode,
                        portfolio,
                        &mut errors,
                        calculators,
                        &*market,
                        &mut outputs,
                        &point,
                    );
                    if let Some(output) = counterparty.as_mut() {
                        run_counterparty_calculators(&counterparties, output, &*market, &point)?;
                    }
                    timings.pricing += start.elapsed();
                }
            }

            let start = Instant::now();
            market.fixing_manager_mut().reset();
            timings.fixing += start.elapsed();
        }

        if options.dry_run {
            info!("Dry run: filling samples beyond the first from time-zero values");
            outputs.cube.fill_from_t0(1, &dry_run_noise)?;
        }

        self.progress.update_progress(samples, samples, "");
        timings.total = loop_start.elapsed();
        info!(
            "Valuation engine completed: loop {:.2} sec, pricing {:.2} sec, update {:.2} sec, fixing {:.2} sec",
            timings.total.as_secs_f64(),
            timings.pricing.as_secs_f64(),
            timings.update.as_secs_f64(),
            timings.fixing.as_secs_f64()
        );

        let mut errored_trades = Vec::with_capacity(errors.errored_count());
        for (index, id) in portfolio.ids().enumerate() {
            if errors.has_error(index) {
                warn!(
                    "Setting all results in output cube to zero for trade '{}' since there was at least one error during simulation",
                    id
                );
                outputs.cube.remove(index)?;
                errored_trades.push(id.clone());
            }
        }

        Ok(CubeBuildReport {
            errors: errors.into_errors(),
            errored_trades,
            samples_valued,
            timings,
        })
    }

    fn check_dimensions(
        &self,
        portfolio: &Portfolio,
        cube: &dyn NpvCube,
        counterparty_cube: Option<&dyn NpvCube>,
    ) -> Result<(), ValuationError> {
        if portfolio.is_empty() {
            return Err(ValuationError::EmptyPortfolio);
        }
        if cube.num_ids() != portfolio.len() {
            return Err(ValuationError::TradeCubeIdsMismatch {
                cube: cube.num_ids(),
                portfolio: portfolio.len(),
            });
        }
        for (expected, id) in portfolio.ids().enumerate() {
            let found = cube.index_of(id.as_str());
            if found != Some(expected) {
                return Err(ValuationError::TradeCubeIdOrder {
                    trade: id.to_string(),
                    expected,
                    found,
                });
            }
        }
        let valuation_dates = self
            .grid
            .is_valuation_date()
            .iter()
            .filter(|flag| **flag)
            .count();
        if cube.num_dates() != valuation_dates {
            return Err(ValuationError::TradeCubeDatesMismatch {
                cube: cube.num_dates(),
                grid: valuation_dates,
            });
        }
        if let Some(cube) = counterparty_cube {
            let expected = portfolio.counterparties().len() + 1;
            if cube.num_ids() != expected {
                return Err(ValuationError::CounterpartyCubeIdsMismatch {
                    cube: cube.num_ids(),
                    expected,
                });
            }
            if let Some(missing) = portfolio
                .counterparties()
                .into_iter()
                .find(|cpty| cube.index_of(cpty.as_str()).is_none())
            {
                return Err(ValuationError::MissingCounterpartyId(missing.to_string()));
            }
            if cube.num_dates() != self.grid.len() {
                return Err(ValuationError::CounterpartyCubeDatesMismatch {
                    cube: cube.num_dates(),
                    grid: self.grid.len(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationEngine")
            .field("today", &self.today)
            .field("grid", &self.grid)
            .field("model_builders", &self.model_builders)
            .field("observation_mode", &self.observation_mode)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

fn calculate_t0(
    trade: &dyn Trade,
    index: usize,
    calculators: &mut [Box<dyn ValuationCalculator>],
    market: &dyn SimMarket,
    outputs: &mut CubeOutputs<'_>,
) -> Result<(), CalculationError> {
    for calc in calculators.iter_mut() {
        calc.calculate_t0(trade, index, market, outputs)?;
    }
    Ok(())
}

fn run_trade_calculators(
    mode: ObservationMode,
    portfolio: &mut Portfolio,
    errors: &mut TradeErrors,
    calculators: &mut [Box<dyn ValuationCalculator>],
    market: &dyn SimMarket,
    outputs: &mut CubeOutputs<'_>,
    point: &ValuationPoint,
) {
    for calc in calculators.iter_mut() {
        calc.init_scenario();
    }
    for (index, (id, trade)) in portfolio.trades_mut().enumerate() {
        if errors.has_error(index) {
            continue;
        }
        if let Err(e) = value_trade(mode, &mut **trade, index, calculators, market, outputs, point) {
            let message = format!(
                "date = {}, sample = {}, label = {}: {}",
                point.date,
                point.sample,
                market.label(),
                e
            );
            errors.record(
                index,
                StructuredTradeError::scenario_valuation(id.as_str(), trade.trade_type(), message),
            );
        }
    }
}

fn value_trade(
    mode: ObservationMode,
    trade: &mut dyn Trade,
    index: usize,
    calculators: &mut [Box<dyn ValuationCalculator>],
    market: &dyn SimMarket,
    outputs: &mut CubeOutputs<'_>,
    point: &ValuationPoint,
) -> Result<(), CalculationError> {
    if mode.refreshes_instruments() {
        trade.update_instruments()?;
    }
    for calc in calculators.iter_mut() {
        calc.calculate(&*trade, index, market, outputs, point)?;
    }
    Ok(())
}

fn run_counterparty_calculators(
    counterparties: &[(String, usize)],
    output: &mut CounterpartyOutput<'_>,
    market: &dyn SimMarket,
    point: &ValuationPoint,
) -> Result<(), ValuationError> {
    for (name, index) in counterparties {
        for calc in output.calculators.iter_mut() {
            calc.calculate(name, *index, market, &mut *output.cube, point)
                .map_err(|source| ValuationError::CounterpartyCalculation {
                    counterparty: name.clone(),
                    source,
                })?;
        }
    }
    Ok(())
}

fn set_exercisable(portfolio: &mut Portfolio, enable: bool) {
    for (_, trade) in portfolio.trades_mut() {
        if let Some(exercisable) = trade.as_exercisable_mut() {
            if enable {
                exercisable.enable_exercise();
            } else {
                exercisable.disable_exercise();
            }
        }
    }
}
