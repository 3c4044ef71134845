//! Paper-trading brokerage.
//!
//! `PaperBroker` implements the SDK seam without a vendor connection so the server and
//! CLI run out of the box. It serves a fixed universe of listed stocks whose daily bars
//! come from a seeded random walk: the same date always yields the same market, and the
//! scanner type only changes how the rows are ranked.
//!
//! Quota accounting lives in a `PaperLedger` shared by every session of one broker.
//! Each scan is charged the size of its JSON-encoded result. Scans still run once the
//! ledger is over its limit; reporting that is the caller's job.
//!
//! The live environment is not available here: `login` on a handle opened with
//! `simulation = false` is rejected.
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::broker::{Account, BrokerApi, BrokerConnector, ScanQuery};
use crate::error::BrokerError;
use crate::record::ScanRecord;
use crate::scanner_type::ScannerType;
use crate::usage::{QuotaStatus, round2};

/// Daily data-transfer budget of a paper account (500 MiB).
pub const DEFAULT_DAILY_LIMIT_BYTES: i64 = 500 * 1024 * 1024;

/// Simulated ticks per trading day.
const TICKS_PER_DAY: usize = 60;
/// Daily price limit relative to the previous close.
const PRICE_LIMIT: f64 = 0.10;

/// (code, name, reference price, liquidity in lots per tick)
const UNIVERSE: &[(&str, &str, f64, u32)] = &[
    ("2330", "台積電", 1050.0, 400),
    ("2317", "鴻海", 180.0, 600),
    ("2454", "聯發科", 1250.0, 120),
    ("2308", "台達電", 390.0, 90),
    ("2382", "廣達", 290.0, 300),
    ("2881", "富邦金", 88.0, 250),
    ("2882", "國泰金", 62.0, 280),
    ("2891", "中信金", 38.0, 500),
    ("2303", "聯電", 48.0, 700),
    ("2412", "中華電", 128.0, 60),
    ("3711", "日月光投控", 160.0, 200),
    ("2886", "兆豐金", 41.0, 220),
    ("2884", "玉山金", 28.0, 350),
    ("1216", "統一", 80.0, 80),
    ("2002", "中鋼", 22.0, 650),
    ("2603", "長榮", 210.0, 450),
    ("2609", "陽明", 70.0, 500),
    ("2615", "萬海", 85.0, 400),
    ("3008", "大立光", 2400.0, 15),
    ("2357", "華碩", 560.0, 50),
    ("2379", "瑞昱", 520.0, 60),
    ("3034", "聯詠", 480.0, 55),
    ("2345", "智邦", 620.0, 70),
    ("3231", "緯創", 110.0, 550),
    ("2356", "英業達", 48.0, 420),
    ("6505", "台塑化", 45.0, 90),
    ("1301", "台塑", 45.0, 150),
    ("1303", "南亞", 40.0, 200),
    ("2912", "統一超", 270.0, 25),
    ("5880", "合庫金", 27.0, 260),
];

/// Shared quota counters of a paper account.
#[derive(Debug, Clone)]
pub struct PaperLedger {
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Debug)]
struct LedgerState {
    bytes_used: i64,
    limit_bytes: i64,
}

impl PaperLedger {
    /// Fresh ledger with nothing used.
    pub fn new(limit_bytes: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LedgerState {
                bytes_used: 0,
                limit_bytes,
            })),
        }
    }

    /// Overwrite the consumed byte count.
    pub fn set_used(&self, bytes_used: i64) -> Result<(), BrokerError> {
        self.lock()?.bytes_used = bytes_used;
        Ok(())
    }

    /// Add `bytes` to the consumed byte count.
    pub fn charge(&self, bytes: i64) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        state.bytes_used = state.bytes_used.saturating_add(bytes);
        Ok(())
    }

    /// Current counters.
    pub fn status(&self) -> Result<QuotaStatus, BrokerError> {
        let state = self.lock()?;
        Ok(QuotaStatus {
            bytes: state.bytes_used,
            limit_bytes: state.limit_bytes,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, BrokerError> {
        self.inner
            .lock()
            .map_err(|e| BrokerError::Disconnected(format!("ledger lock poisoned: {}", e)))
    }
}

impl Default for PaperLedger {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT_BYTES)
    }
}

/// Connector handing out paper-trading handles.
#[derive(Debug, Clone, Default)]
pub struct PaperBroker {
    ledger: PaperLedger,
    latency: Duration,
}

impl PaperBroker {
    /// Broker charging scans to `ledger`.
    pub fn new(ledger: PaperLedger) -> Self {
        Self {
            ledger,
            latency: Duration::ZERO,
        }
    }

    /// Delay every scan by `latency`. A latency above the scan budget makes scans time out.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Quota counters shared by this broker's sessions.
    pub fn ledger(&self) -> &PaperLedger {
        &self.ledger
    }
}

impl BrokerConnector for PaperBroker {
    fn connect(&self, simulation: bool) -> Box<dyn BrokerApi> {
        Box::new(PaperSession {
            ledger: self.ledger.clone(),
            latency: self.latency,
            simulation,
            logged_in: false,
        })
    }
}

struct PaperSession {
    ledger: PaperLedger,
    latency: Duration,
    simulation: bool,
    logged_in: bool,
}

impl PaperSession {
    fn ensure_logged_in(&self) -> Result<(), BrokerError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(BrokerError::Rejected("login required".to_string()))
        }
    }
}

impl BrokerApi for PaperSession {
    fn login(&mut self, api_key: &str, secret_key: &str) -> Result<Vec<Account>, BrokerError> {
        if !self.simulation {
            return Err(BrokerError::Rejected(
                "live environment is not available from the paper broker".to_string(),
            ));
        }
        if api_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err(BrokerError::Rejected("empty credentials".to_string()));
        }
        self.logged_in = true;

        let account_id = api_key
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
            % 10_000_000;
        Ok(vec![Account {
            broker_id: "9A95".to_string(),
            account_id: format!("{:07}", account_id),
            username: "PAPER".to_string(),
            account_type: "S".to_string(),
        }])
    }

    fn activate_ca(&mut self, ca_path: &str, ca_passwd: &str) -> Result<(), BrokerError> {
        self.ensure_logged_in()?;
        if ca_path.trim().is_empty() || ca_passwd.is_empty() {
            return Err(BrokerError::Rejected("certificate path or password is empty".to_string()));
        }
        Ok(())
    }

    fn usage(&mut self) -> Result<QuotaStatus, BrokerError> {
        self.ensure_logged_in()?;
        self.ledger.status()
    }

    fn scanners(&mut self, query: &ScanQuery) -> Result<Option<Vec<ScanRecord>>, BrokerError> {
        self.ensure_logged_in()?;
        let budget = Duration::from_millis(query.timeout_ms);
        if self.latency > budget {
            thread::sleep(budget);
            return Err(BrokerError::Timeout(query.timeout_ms));
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        let rows = rank(query);
        let charged = serde_json::to_vec(&rows)
            .map_err(|e| BrokerError::Disconnected(format!("encoding failed: {}", e)))?
            .len();
        self.ledger.charge(charged as i64)?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows))
        }
    }

    fn logout(&mut self) -> Result<(), BrokerError> {
        self.ensure_logged_in()?;
        self.logged_in = false;
        Ok(())
    }
}

/// Daily bar of one stock.
struct DailyBar {
    code: &'static str,
    name: &'static str,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    prev_close: f64,
    volume: i64,
    amount: i64,
    tick_count: i64,
}

impl DailyBar {
    fn change_price(&self) -> f64 {
        round2(self.close - self.prev_close)
    }

    fn change_percent(&self) -> f64 {
        round2((self.close - self.prev_close) / self.prev_close * 100.0)
    }

    fn rank_value(&self, scanner_type: ScannerType) -> f64 {
        match scanner_type {
            ScannerType::ChangePercentRank => self.change_percent(),
            ScannerType::ChangePriceRank => self.change_price(),
            ScannerType::DayRangeRank => round2((self.high - self.low) / self.prev_close * 100.0),
            ScannerType::VolumeRank => self.volume as f64,
            ScannerType::AmountRank => self.amount as f64,
            ScannerType::TickCountRank => self.tick_count as f64,
        }
    }
}

/// Next synthetic price: a uniform step of at most 1% around `current_price`.
fn next_price(rng: &mut StdRng, current_price: f64) -> f64 {
    let change: f64 = rng.random_range(-0.01..0.01);
    (current_price * (1.0 + change)).max(0.01)
}

fn simulate_day(date: NaiveDate, index: usize) -> DailyBar {
    let (code, name, reference, liquidity) = UNIVERSE[index];
    let seed = (date.num_days_from_ce() as u64) << 16 | index as u64;
    let mut rng = StdRng::seed_from_u64(seed);

    let prev_close = round2(reference * (1.0 + rng.random_range(-0.2..0.2)));
    let floor = prev_close * (1.0 - PRICE_LIMIT);
    let ceiling = prev_close * (1.0 + PRICE_LIMIT);

    let open = next_price(&mut rng, prev_close).clamp(floor, ceiling);
    let (mut high, mut low, mut price) = (open, open, open);
    let mut volume = 0i64;
    let mut amount = 0f64;
    let mut tick_count = 0i64;

    for _ in 0..TICKS_PER_DAY {
        price = next_price(&mut rng, price).clamp(floor, ceiling);
        high = high.max(price);
        low = low.min(price);
        let lots = liquidity as i64 + rng.random_range(0..liquidity as i64 * 5);
        volume += lots;
        amount += price * lots as f64 * 1000.0;
        tick_count += rng.random_range(1..20);
    }

    DailyBar {
        code,
        name,
        open: round2(open),
        high: round2(high),
        low: round2(low),
        close: round2(price),
        prev_close,
        volume,
        amount: amount.round() as i64,
        tick_count,
    }
}

fn rank(query: &ScanQuery) -> Vec<ScanRecord> {
    let mut bars: Vec<(f64, DailyBar)> = (0..UNIVERSE.len())
        .map(|index| simulate_day(query.date, index))
        .map(|bar| (bar.rank_value(query.scanner_type), bar))
        .collect();
    bars.sort_by(|(a, _), (b, _)| {
        if query.ascending {
            a.total_cmp(b)
        } else {
            b.total_cmp(a)
        }
    });
    bars.truncate(query.count as usize);

    let date = query.date.format("%Y-%m-%d").to_string();
    let ts = query
        .date
        .and_hms_opt(5, 30, 0)
        .and_then(|dt| dt.and_utc().timestamp_nanos_opt());

    bars.into_iter()
        .map(|(rank_value, bar)| {
            ScanRecord::new()
                .with("date", date.as_str())
                .with("code", bar.code)
                .with("name", bar.name)
                .with("ts", ts)
                .with("open", bar.open)
                .with("high", bar.high)
                .with("low", bar.low)
                .with("close", bar.close)
                .with("change_price", bar.change_price())
                .with("change_percent", bar.change_percent())
                .with("volume", bar.volume)
                .with("amount", bar.amount)
                .with("tick_count", bar.tick_count)
                .with("rank_value", rank_value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{COMMON_FIELDS, FieldValue};

    fn query(scanner_type: ScannerType, count: u16, ascending: bool) -> ScanQuery {
        ScanQuery {
            scanner_type,
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            count,
            ascending,
            timeout_ms: 1_000,
        }
    }

    fn logged_in(broker: &PaperBroker) -> Box<dyn BrokerApi> {
        let mut api = broker.connect(true);
        api.login("key", "secret").unwrap();
        api
    }

    fn rank_values(rows: &[ScanRecord]) -> Vec<f64> {
        rows.iter()
            .map(|row| match row.get("rank_value") {
                Some(FieldValue::Float(v)) => *v,
                other => panic!("unexpected rank_value {:?}", other),
            })
            .collect()
    }

    #[test]
    fn same_query_is_stable() {
        let broker = PaperBroker::default();
        let mut api = logged_in(&broker);
        let q = query(ScannerType::ChangePercentRank, 10, true);

        let first = api.scanners(&q).unwrap().unwrap();
        let second = api.scanners(&q).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn rows_are_sorted_by_rank_value() {
        let broker = PaperBroker::default();
        let mut api = logged_in(&broker);

        let asc = rank_values(&api.scanners(&query(ScannerType::VolumeRank, 200, true)).unwrap().unwrap());
        assert_eq!(asc.len(), UNIVERSE.len());
        assert!(asc.windows(2).all(|w| w[0] <= w[1]));

        let desc = rank_values(&api.scanners(&query(ScannerType::DayRangeRank, 5, false)).unwrap().unwrap());
        assert_eq!(desc.len(), 5);
        assert!(desc.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rows_carry_common_fields() {
        let broker = PaperBroker::default();
        let mut api = logged_in(&broker);
        let rows = api.scanners(&query(ScannerType::AmountRank, 1, false)).unwrap().unwrap();

        for field in COMMON_FIELDS {
            assert!(rows[0].get(field).is_some(), "missing {}", field);
        }
        assert_eq!(rows[0].get("date"), Some(&FieldValue::Text("2026-01-02".into())));
    }

    #[test]
    fn scans_are_charged_to_the_shared_ledger() {
        let broker = PaperBroker::new(PaperLedger::new(1_000_000));
        let mut api = logged_in(&broker);
        assert_eq!(api.usage().unwrap().bytes, 0);

        api.scanners(&query(ScannerType::TickCountRank, 3, true)).unwrap();
        let used = broker.ledger().status().unwrap().bytes;
        assert!(used > 0);

        let mut other = logged_in(&broker);
        assert_eq!(other.usage().unwrap().bytes, used);
    }

    #[test]
    fn live_login_is_rejected() {
        let broker = PaperBroker::default();
        let mut api = broker.connect(false);
        assert!(matches!(api.login("key", "secret"), Err(BrokerError::Rejected(_))));
    }

    #[test]
    fn calls_before_login_are_rejected() {
        let broker = PaperBroker::default();
        let mut api = broker.connect(true);
        assert!(api.usage().is_err());
        assert!(api.logout().is_err());
        assert!(api.scanners(&query(ScannerType::VolumeRank, 1, true)).is_err());
    }

    #[test]
    fn latency_beyond_budget_times_out() {
        let broker = PaperBroker::default().with_latency(Duration::from_millis(50));
        let mut api = logged_in(&broker);
        let mut q = query(ScannerType::VolumeRank, 1, true);
        q.timeout_ms = 5;

        assert_eq!(api.scanners(&q), Err(BrokerError::Timeout(5)));
    }
}
