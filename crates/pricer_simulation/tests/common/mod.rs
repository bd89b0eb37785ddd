//! Shared fixtures for valuation engine integration tests.
//!
//! Every mock writes to one [`EventLog`] so tests can assert on the exact
//! interleaving of market updates, recalibrations and calculator calls.

#![allow(dead_code)]

use pricer_core::types::{Date, DateGrid};
use pricer_simulation::calculator::{CubeOutputs, ValuationPoint};
use pricer_simulation::cube::NpvCube;
use pricer_simulation::error::CalculationError;
use pricer_simulation::market::{FixingManager, MarketError, SharedMarket, SimMarket};
use pricer_simulation::model::{ModelBuilder, ModelError};
use pricer_simulation::portfolio::{CounterpartyId, Exercisable, Portfolio, Trade, TradeId};
use pricer_simulation::progress::ProgressIndicator;
use pricer_simulation::{CounterpartyCalculator, ValuationCalculator};
use std::sync::{Arc, Mutex};

/// Something observable that happened during a cube build.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    PreUpdate,
    UpdateDate(Date),
    UpdateScenario(Date),
    PostUpdate(Date, bool),
    UpdateAsd(Date),
    MarketReset,
    FixingsInitialised,
    FixingsReset,
    ForceRecalculate,
    Recalibrate,
    Calibrated,
    TradeReset(String),
    UpdateInstruments(String),
    UnregisterFloatingLegs(String),
    ExerciseEnabled(String, bool),
    Npv {
        trade: String,
        asof: Date,
        exercise_enabled: bool,
    },
    Calc {
        trade: usize,
        date_index: usize,
        sample: usize,
        close_out: bool,
    },
    CptyCalc {
        counterparty: String,
        grid_index: usize,
        sample: usize,
    },
    Progress(usize, usize),
    ProgressReset,
}

/// Event log shared by all mocks of one test.
pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn push(log: &EventLog, event: Event) {
    log.lock().unwrap().push(event);
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

pub fn count(log: &EventLog, pred: impl Fn(&Event) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|e| pred(e)).count()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

pub fn today() -> Date {
    date(2024, 1, 2)
}

// ============================================================================
// Market
// ============================================================================

pub struct RecordingFixings {
    log: EventLog,
}

impl FixingManager for RecordingFixings {
    fn initialise(&mut self, _portfolio: &Portfolio, _asof: Date) -> Result<(), MarketError> {
        push(&self.log, Event::FixingsInitialised);
        Ok(())
    }

    fn reset(&mut self) {
        push(&self.log, Event::FixingsReset);
    }
}

/// Market whose valuation date follows `update_date` and that can be told
/// to fail scenario updates on one date.
pub struct RecordingMarket {
    today: Date,
    asof: Date,
    log: EventLog,
    fixings: RecordingFixings,
    fail_scenario_on: Option<Date>,
    survival: f64,
}

impl RecordingMarket {
    pub fn new(log: &EventLog) -> Self {
        Self {
            today: today(),
            asof: today(),
            log: Arc::clone(log),
            fixings: RecordingFixings {
                log: Arc::clone(log),
            },
            fail_scenario_on: None,
            survival: 0.98,
        }
    }

    pub fn failing_scenario_on(mut self, date: Date) -> Self {
        self.fail_scenario_on = Some(date);
        self
    }

    pub fn shared(self) -> (Arc<Mutex<RecordingMarket>>, SharedMarket) {
        let concrete = Arc::new(Mutex::new(self));
        let shared: SharedMarket = concrete.clone();
        (concrete, shared)
    }

    pub fn asof(&self) -> Date {
        self.asof
    }
}

impl SimMarket for RecordingMarket {
    fn asof_date(&self) -> Date {
        self.asof
    }

    fn label(&self) -> &str {
        "simulation"
    }

    fn pre_update(&mut self) {
        push(&self.log, Event::PreUpdate);
    }

    fn update_date(&mut self, date: Date) -> Result<(), MarketError> {
        push(&self.log, Event::UpdateDate(date));
        self.asof = date;
        Ok(())
    }

    fn update_scenario(&mut self, date: Date) -> Result<(), MarketError> {
        push(&self.log, Event::UpdateScenario(date));
        if self.fail_scenario_on == Some(date) {
            return Err(MarketError::MissingQuote("EUR-ESTR".to_string()));
        }
        Ok(())
    }

    fn post_update(&mut self, date: Date, with_fixings: bool) -> Result<(), MarketError> {
        push(&self.log, Event::PostUpdate(date, with_fixings));
        Ok(())
    }

    fn update_aggregation_scenario_data(&mut self, date: Date) -> Result<(), MarketError> {
        push(&self.log, Event::UpdateAsd(date));
        Ok(())
    }

    fn reset(&mut self) {
        push(&self.log, Event::MarketReset);
        self.asof = self.today;
    }

    fn fixing_manager_mut(&mut self) -> &mut dyn FixingManager {
        &mut self.fixings
    }

    fn survival_probability(&self, _name: &str) -> Result<f64, MarketError> {
        Ok(self.survival)
    }
}

// ============================================================================
// Trades
// ============================================================================

/// Trade worth `value` plus the number of days from today to the market
/// date, so sticky close-out dates are visible in the cube.
pub struct MockTrade {
    id: String,
    currency: String,
    value: f64,
    cpty: CounterpartyId,
    log: EventLog,
    fail_on: Option<Date>,
    fail_refresh: bool,
    exercise: Option<bool>,
}

impl MockTrade {
    pub fn new(id: &str, cpty: &str, value: f64, log: &EventLog) -> Self {
        Self {
            id: id.to_string(),
            currency: "EUR".to_string(),
            value,
            cpty: CounterpartyId::new(cpty),
            log: Arc::clone(log),
            fail_on: None,
            fail_refresh: false,
            exercise: None,
        }
    }

    /// Pricing fails whenever the market sits on `date`.
    pub fn failing_on(mut self, date: Date) -> Self {
        self.fail_on = Some(date);
        self
    }

    /// `update_instruments` fails.
    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    /// Gives the trade an exercise right, initially enabled.
    pub fn exercisable(mut self) -> Self {
        self.exercise = Some(true);
        self
    }

    pub fn without_currency(mut self) -> Self {
        self.currency.clear();
        self
    }
}

impl Trade for MockTrade {
    fn trade_type(&self) -> &str {
        if self.exercise.is_some() {
            "Swaption"
        } else {
            "Swap"
        }
    }

    fn npv_currency(&self) -> &str {
        &self.currency
    }

    fn counterparty(&self) -> &CounterpartyId {
        &self.cpty
    }

    fn npv(&self, market: &dyn SimMarket) -> Result<f64, CalculationError> {
        let asof = market.asof_date();
        push(
            &self.log,
            Event::Npv {
                trade: self.id.clone(),
                asof,
                exercise_enabled: self.exercise.unwrap_or(true),
            },
        );
        if self.fail_on == Some(asof) {
            return Err(CalculationError::Pricing(format!("no curve on {asof}")));
        }
        Ok(self.value + (asof - today()) as f64)
    }

    fn reset(&mut self) {
        push(&self.log, Event::TradeReset(self.id.clone()));
    }

    fn update_instruments(&mut self) -> Result<(), CalculationError> {
        push(&self.log, Event::UpdateInstruments(self.id.clone()));
        if self.fail_refresh {
            return Err(CalculationError::Pricing("stale index".to_string()));
        }
        Ok(())
    }

    fn unregister_floating_legs(&mut self) {
        push(&self.log, Event::UnregisterFloatingLegs(self.id.clone()));
    }

    fn as_exercisable_mut(&mut self) -> Option<&mut dyn Exercisable> {
        if self.exercise.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl Exercisable for MockTrade {
    fn enable_exercise(&mut self) {
        self.exercise = Some(true);
        push(&self.log, Event::ExerciseEnabled(self.id.clone(), true));
    }

    fn disable_exercise(&mut self) {
        self.exercise = Some(false);
        push(&self.log, Event::ExerciseEnabled(self.id.clone(), false));
    }

    fn is_exercise_enabled(&self) -> bool {
        self.exercise.unwrap_or(false)
    }
}

pub fn portfolio(trades: Vec<MockTrade>) -> Portfolio {
    let mut portfolio = Portfolio::new();
    for trade in trades {
        let id = TradeId::new(trade.id.clone());
        portfolio.add(id, Box::new(trade)).unwrap();
    }
    portfolio
}

// ============================================================================
// Calculators
// ============================================================================

/// Writes trade NPVs at depth 0, and close-out NPVs at `close_out_depth`
/// if set, logging every call.
pub struct RecordingCalculator {
    log: EventLog,
    close_out_depth: Option<usize>,
}

impl RecordingCalculator {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
            close_out_depth: None,
        }
    }

    pub fn with_close_out_depth(mut self, depth: usize) -> Self {
        self.close_out_depth = Some(depth);
        self
    }

    pub fn boxed(self) -> Vec<Box<dyn ValuationCalculator>> {
        vec![Box::new(self)]
    }
}

impl ValuationCalculator for RecordingCalculator {
    fn calculate_t0(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
    ) -> Result<(), CalculationError> {
        let npv = trade.npv(market)?;
        outputs.cube.set_t0(npv, trade_index, 0)?;
        Ok(())
    }

    fn calculate(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError> {
        push(
            &self.log,
            Event::Calc {
                trade: trade_index,
                date_index: point.date_index,
                sample: point.sample,
                close_out: point.is_close_out,
            },
        );
        let npv = trade.npv(market)?;
        if !point.is_close_out {
            outputs
                .cube
                .set(npv, trade_index, point.date_index, point.sample, 0)?;
            return Ok(());
        }
        if let Some(depth) = self.close_out_depth {
            outputs
                .cube
                .set(npv, trade_index, point.date_index, point.sample, depth)?;
        }
        if let Some(cube) = outputs.close_out_cube.as_deref_mut() {
            cube.set(npv, trade_index, point.date_index, point.sample, 0)?;
        }
        Ok(())
    }
}

/// Counterparty calculator that logs calls and can fail for one name.
pub struct RecordingCptyCalculator {
    log: EventLog,
    fail_for: Option<String>,
}

impl RecordingCptyCalculator {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
            fail_for: None,
        }
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for = Some(name.to_string());
        self
    }
}

impl CounterpartyCalculator for RecordingCptyCalculator {
    fn calculate(
        &mut self,
        counterparty: &str,
        _index: usize,
        _market: &dyn SimMarket,
        _cube: &mut dyn NpvCube,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError> {
        push(
            &self.log,
            Event::CptyCalc {
                counterparty: counterparty.to_string(),
                grid_index: point.grid_index,
                sample: point.sample,
            },
        );
        if self.fail_for.as_deref() == Some(counterparty) {
            return Err(CalculationError::Pricing("no default curve".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Models and progress
// ============================================================================

/// Recalibrates only when dirty; nothing ever makes it dirty except a
/// forced recalculation.
pub struct CountingModelBuilder {
    log: EventLog,
    dirty: bool,
    fail: bool,
}

impl CountingModelBuilder {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
            dirty: false,
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl ModelBuilder for CountingModelBuilder {
    fn recalibrate(&mut self) -> Result<(), ModelError> {
        push(&self.log, Event::Recalibrate);
        if self.fail {
            return Err(ModelError::MissingTarget("EUR swaption basket".to_string()));
        }
        if self.dirty {
            push(&self.log, Event::Calibrated);
            self.dirty = false;
        }
        Ok(())
    }

    fn force_recalculate(&mut self) {
        push(&self.log, Event::ForceRecalculate);
        self.dirty = true;
    }
}

pub struct RecordingProgress {
    log: EventLog,
}

impl RecordingProgress {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl ProgressIndicator for RecordingProgress {
    fn update_progress(&mut self, progress: usize, total: usize, _detail: &str) {
        push(&self.log, Event::Progress(progress, total));
    }

    fn reset(&mut self) {
        push(&self.log, Event::ProgressReset);
    }
}

// ============================================================================
// Grids
// ============================================================================

/// Two quarterly valuation dates.
pub fn quarterly_grid() -> DateGrid {
    DateGrid::new(vec![date(2024, 4, 2), date(2024, 7, 2)]).unwrap()
}

/// Valuation dates on 2 Apr and 2 Jul, close-out date on 2 Jul only.
pub fn coincident_close_out_grid() -> DateGrid {
    DateGrid::with_flags(
        vec![date(2024, 4, 2), date(2024, 7, 2)],
        vec![true, true],
        vec![false, true],
    )
    .unwrap()
}

/// Valuation dates on 2 Apr and 2 Jul, each followed by a separate
/// close-out date two weeks later.
pub fn separate_close_out_grid() -> DateGrid {
    DateGrid::with_flags(
        vec![
            date(2024, 4, 2),
            date(2024, 4, 16),
            date(2024, 7, 2),
            date(2024, 7, 16),
        ],
        vec![true, false, true, false],
        vec![false, true, false, true],
    )
    .unwrap()
}
