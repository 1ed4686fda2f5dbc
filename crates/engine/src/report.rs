//! Analysis of the report downloaded from the ledger.
//!
//! The report is a TSV file with one row per live entry:
//!
//! ```text
//! 日付	部類	リク	あん	備考
//! 2024-04-21	日常	-1234		スーパー
//! ```
//!
//! Amounts follow the ledger convention: negative for an expense, positive
//! for a gain, empty when the member is not involved.

use std::{fmt, io::Read};

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::{EngineError, Member, ResultEngine, Yen};

/// Category of salaries, expected once a month per earner.
pub const SALARY_CATEGORY: &str = "給料";
/// Category of monthly bills, expected once a month per bill.
pub const BILL_CATEGORY: &str = "月額";

/// Bills paid by hand get two weeks of slack on top of a month.
const MAX_GAP: TimeDelta = TimeDelta::days(45);
const MIN_GAP: TimeDelta = TimeDelta::days(15);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub category: String,
    pub riku: Option<Yen>,
    pub anju: Option<Yen>,
    pub remark: String,
}

impl ReportRow {
    pub fn amount(&self, member: Member) -> Option<Yen> {
        match member {
            Member::Riku => self.riku,
            Member::Anju => self.anju,
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = |v: Option<Yen>| v.map(|y| y.to_string()).unwrap_or_default();
        write!(
            f,
            "{} {} {} {} {}",
            self.date,
            self.category,
            amount(self.riku),
            amount(self.anju),
            self.remark
        )
    }
}

#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(mut rows: Vec<ReportRow>) -> Self {
        rows.sort();
        Self { rows }
    }

    /// Reads a report, skipping the header line.
    pub fn from_tsv<R: Read>(reader: R) -> ResultEngine<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // Line 1 is the header.
            let line = index + 2;
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d").map_err(|_| {
                EngineError::InvalidReport(format!("line {line}: bad date \"{}\"", field(0)))
            })?;
            let amount = |i: usize| -> ResultEngine<Option<Yen>> {
                let raw = field(i);
                if raw.is_empty() {
                    return Ok(None);
                }
                raw.parse::<Yen>().map(Some).map_err(|_| {
                    EngineError::InvalidReport(format!("line {line}: bad amount \"{raw}\""))
                })
            };

            rows.push(ReportRow {
                date,
                category: field(1).to_string(),
                riku: amount(2)?,
                anju: amount(3)?,
                remark: field(4).to_string(),
            });
        }

        tracing::debug!("report loaded with {} rows", rows.len());
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Totals per member, and who owes what to settle the household.
    ///
    /// Totals that do not fit in an `i64` are reported as an invalid report.
    pub fn summarize(&self) -> ResultEngine<Summary> {
        let overflow = || EngineError::InvalidReport("totals overflow".to_string());
        let total = |member: Member| {
            self.rows
                .iter()
                .filter_map(|row| row.amount(member))
                .try_fold(Yen::ZERO, Yen::checked_add)
                .ok_or_else(overflow)
        };
        let riku = total(Member::Riku)?;
        let anju = total(Member::Anju)?;

        let (debtor, creditor, difference) = if riku > anju {
            (Member::Riku, Member::Anju, riku.checked_sub(anju))
        } else {
            (Member::Anju, Member::Riku, anju.checked_sub(riku))
        };
        // The difference of two i64 totals may not fit in an i64, its half does.
        let half = match difference {
            Some(difference) => difference.value() / 2,
            None => ((i128::from(riku.value()) - i128::from(anju.value())).abs() / 2)
                .try_into()
                .map_err(|_| overflow())?,
        };
        let settlement = (riku != anju).then_some(Settlement {
            debtor,
            creditor,
            amount: Yen::new(half),
        });

        Ok(Summary {
            riku,
            anju,
            settlement,
        })
    }

    /// Looks for suspicious data: duplicated rows, and monthly operations
    /// (salaries, bills) that are missing, too close or too frequent.
    pub fn validate(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        for pair in self.rows.windows(2) {
            if pair[0] == pair[1] {
                findings.push(Finding::Duplicate(pair[1].clone()));
            }
        }

        let mut series: Vec<Series> = Vec::new();
        for row in &self.rows {
            let name = match row.category.as_str() {
                SALARY_CATEGORY => {
                    let earner = if !row.remark.is_empty() {
                        row.remark.as_str()
                    } else if row.riku.is_some() {
                        Member::Riku.display_name()
                    } else if row.anju.is_some() {
                        Member::Anju.display_name()
                    } else {
                        "ø"
                    };
                    format!("{SALARY_CATEGORY} {earner}")
                }
                BILL_CATEGORY => {
                    if row.remark.is_empty() {
                        findings.push(Finding::UnknownBill(row.clone()));
                        continue;
                    }
                    format!("{BILL_CATEGORY} {}", row.remark)
                }
                _ => continue,
            };

            match series.iter_mut().find(|s| s.name == name) {
                Some(current) => {
                    let gap = row.date - current.last;
                    if gap > MAX_GAP {
                        findings.push(Finding::MissingPayment {
                            series: name.clone(),
                            from: current.last,
                            to: row.date,
                        });
                    } else if gap < MIN_GAP {
                        findings.push(Finding::ClosePayments {
                            series: name.clone(),
                            from: current.last,
                            to: row.date,
                        });
                    }
                    current.last = row.date;
                    current.count += 1;
                }
                None => series.push(Series {
                    name,
                    first: row.date,
                    last: row.date,
                    count: 1,
                }),
            }
        }

        for s in series {
            // Months touched: from January 1st to March 1st counts as 3.
            let span = (s.last.year() - s.first.year()) * 12 + s.last.month() as i32
                - s.first.month() as i32
                + 1;
            let span = span as usize;
            // Paying on the 1st and the 30th gives 2 payments in 1 month, and
            // January 30th then March 1st gives 2 payments over 3 months.
            if s.count + 1 < span || s.count > span + 1 {
                findings.push(Finding::PaymentCount {
                    series: s.name,
                    count: s.count,
                    expected: span,
                    first: s.first,
                    last: s.last,
                });
            }
        }

        findings
    }
}

struct Series {
    name: String,
    first: NaiveDate,
    last: NaiveDate,
    count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub debtor: Member,
    pub creditor: Member,
    pub amount: Yen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub riku: Yen,
    pub anju: Yen,
    pub settlement: Option<Settlement>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", Member::Riku.display_name(), self.riku)?;
        writeln!(f, "{}: {}", Member::Anju.display_name(), self.anju)?;
        match self.settlement {
            Some(s) => write!(
                f,
                "{} owes {} to {}.",
                s.debtor.display_name(),
                s.amount.format_plain(),
                s.creditor.display_name()
            ),
            None => write!(f, "Nothing to settle."),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finding {
    Duplicate(ReportRow),
    UnknownBill(ReportRow),
    MissingPayment {
        series: String,
        from: NaiveDate,
        to: NaiveDate,
    },
    ClosePayments {
        series: String,
        from: NaiveDate,
        to: NaiveDate,
    },
    PaymentCount {
        series: String,
        count: usize,
        expected: usize,
        first: NaiveDate,
        last: NaiveDate,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(row) => write!(f, "duplicate: {row}"),
            Self::UnknownBill(row) => write!(f, "unknown bill: {row}"),
            Self::MissingPayment { series, from, to } => {
                write!(f, "{series}: no payment between {from} and {to}")
            }
            Self::ClosePayments { series, from, to } => {
                write!(f, "{series}: close payments on {from} and {to}")
            }
            Self::PaymentCount {
                series,
                count,
                expected,
                first,
                last,
            } => write!(
                f,
                "{series}: {count} payments instead of {expected} between {first} and {last}"
            ),
        }
    }
}
