//! Entries sent during the current session.
//!
//! The history exists to spot duplicates and to withdraw a mistake right
//! after sending it. It only covers the running session: older entries are
//! edited on the server.

use api_types::entry::{EntryId, EntryNew};

use crate::{Member, Yen};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    Sent,
    /// A withdrawal request is in flight; the row cannot be withdrawn again.
    Withdrawing,
    Withdrawn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: EntryId,
    pub entry: EntryNew,
    pub status: RowStatus,
}

impl HistoryRow {
    pub fn date_label(&self) -> String {
        date_label(&self.entry.date.format("%Y-%m-%d").to_string())
    }

    pub fn amount(&self, member: Member) -> Yen {
        let amount = match member {
            Member::Riku => self.entry.riku,
            Member::Anju => self.entry.anju,
        };
        Yen::new(amount.unwrap_or_default())
    }

    pub fn amount_label(&self, member: Member) -> String {
        self.amount(member).format_signed()
    }

    pub fn can_withdraw(&self) -> bool {
        self.status == RowStatus::Sent
    }
}

#[derive(Debug, Default)]
pub struct History {
    rows: Vec<HistoryRow>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: EntryNew, id: EntryId) -> usize {
        self.rows.push(HistoryRow {
            id,
            entry,
            status: RowStatus::Sent,
        });
        self.rows.len() - 1
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&HistoryRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Disables the row and returns the id to withdraw, or `None` when the
    /// row is missing, already withdrawn or being withdrawn.
    pub fn begin_withdraw(&mut self, index: usize) -> Option<EntryId> {
        let row = self.rows.get_mut(index)?;
        if !row.can_withdraw() {
            return None;
        }
        row.status = RowStatus::Withdrawing;
        Some(row.id.clone())
    }

    /// Marks the row withdrawn on success, or enables it again on failure.
    pub fn finish_withdraw(&mut self, index: usize, succeeded: bool) {
        if let Some(row) = self.rows.get_mut(index)
            && row.status == RowStatus::Withdrawing
        {
            row.status = if succeeded {
                RowStatus::Withdrawn
            } else {
                RowStatus::Sent
            };
        }
    }
}

/// Turns an ISO date into the short Japanese form: `2024-04-05` → `4月5日`.
///
/// Anything that does not look like `Y-M-D` is returned unchanged.
pub fn date_label(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return date.to_string();
    }
    format!("{}月{}日", strip_one_zero(parts[1]), strip_one_zero(parts[2]))
}

fn strip_one_zero(part: &str) -> &str {
    match part.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => rest,
        _ => part,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(riku: Option<i64>, anju: Option<i64>) -> EntryNew {
        EntryNew {
            date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            riku,
            anju,
            remark: String::new(),
            category: "日常".to_string(),
            registration: String::new(),
        }
    }

    #[test]
    fn date_label_drops_year_and_leading_zeros() {
        assert_eq!(date_label("2024-04-05"), "4月5日");
        assert_eq!(date_label("2024-12-31"), "12月31日");
        assert_eq!(date_label("2024-10-00"), "10月0日");
        assert_eq!(date_label("yesterday"), "yesterday");
    }

    #[test]
    fn amount_label_uses_member_column() {
        let mut history = History::new();
        history.push(entry(Some(-5000), Some(5000)), EntryId::Number(1));
        let row = &history.rows()[0];
        assert_eq!(row.date_label(), "4月5日");
        assert_eq!(row.amount_label(Member::Riku), "-5,000円");
        assert_eq!(row.amount_label(Member::Anju), "+5,000円");
    }

    #[test]
    fn withdraw_lifecycle() {
        let mut history = History::new();
        let index = history.push(entry(Some(-100), None), EntryId::Text("7+1".to_string()));

        assert_eq!(history.begin_withdraw(index), Some(EntryId::Text("7+1".to_string())));
        assert_eq!(history.begin_withdraw(index), None);

        history.finish_withdraw(index, false);
        assert_eq!(history.rows()[index].status, RowStatus::Sent);

        assert!(history.begin_withdraw(index).is_some());
        history.finish_withdraw(index, true);
        assert_eq!(history.rows()[index].status, RowStatus::Withdrawn);
        assert_eq!(history.begin_withdraw(index), None);
        assert_eq!(history.begin_withdraw(42), None);
    }
}
