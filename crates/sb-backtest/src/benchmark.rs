use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Benchmark construction and alignment errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BenchmarkError {
    Empty,
    DuplicateDate(NaiveDate),
    NonPositiveClose { date: NaiveDate, close: Decimal },
    /// A simulated date has no benchmark observation.
    MissingDate(NaiveDate),
}

impl std::fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkError::Empty => write!(f, "benchmark series is empty"),
            BenchmarkError::DuplicateDate(d) => write!(f, "duplicate benchmark date {}", d),
            BenchmarkError::NonPositiveClose { date, close } => {
                write!(f, "non-positive benchmark close on {}: {}", date, close)
            }
            BenchmarkError::MissingDate(d) => write!(f, "no benchmark observation on {}", d),
        }
    }
}

impl std::error::Error for BenchmarkError {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub close: Decimal,
    /// `(close - prev_close) / prev_close`; zero on the first point.
    pub period_return: Decimal,
    /// `(close - first_close) / first_close`.
    pub cumulative_return: Decimal,
}

/// Date-ascending index closes with derived returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkSeries {
    points: Vec<BenchmarkPoint>,
}

impl BenchmarkSeries {
    pub fn from_closes(mut closes: Vec<(NaiveDate, Decimal)>) -> Result<Self, BenchmarkError> {
        if closes.is_empty() {
            return Err(BenchmarkError::Empty);
        }
        closes.sort_by_key(|(d, _)| *d);
        if let Some(w) = closes.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(BenchmarkError::DuplicateDate(w[0].0));
        }
        if let Some((date, close)) = closes.iter().find(|(_, c)| *c <= Decimal::ZERO) {
            return Err(BenchmarkError::NonPositiveClose {
                date: *date,
                close: *close,
            });
        }

        let first = closes[0].1;
        let mut prev = first;
        let points = closes
            .into_iter()
            .map(|(date, close)| {
                let p = BenchmarkPoint {
                    date,
                    close,
                    period_return: (close - prev) / prev,
                    cumulative_return: (close - first) / first,
                };
                prev = close;
                p
            })
            .collect();
        Ok(Self { points })
    }

    pub fn points(&self) -> &[BenchmarkPoint] {
        &self.points
    }

    pub fn returns(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.period_return).collect()
    }

    /// Benchmark period returns for exactly the given dates.
    pub fn aligned_returns(&self, dates: &[NaiveDate]) -> Result<Vec<Decimal>, BenchmarkError> {
        dates
            .iter()
            .map(|d| {
                self.points
                    .binary_search_by_key(d, |p| p.date)
                    .map(|i| self.points[i].period_return)
                    .map_err(|_| BenchmarkError::MissingDate(*d))
            })
            .collect()
    }
}
