//! The entry form: what the user is currently typing before sending it.

use api_types::{entry::EntryNew, receipt::Receipt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CategoryCatalog, EngineError, Member, ResultEngine, Yen, category::split};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Date,
    Amount,
    Category,
    Remark,
    Registration,
}

impl FormField {
    pub const ORDER: [FormField; 5] = [
        FormField::Date,
        FormField::Amount,
        FormField::Category,
        FormField::Remark,
        FormField::Registration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Date => "日付",
            Self::Amount => "金額",
            Self::Category => "部類",
            Self::Remark => "備考",
            Self::Registration => "登録番号",
        }
    }

    pub fn next(self) -> FormField {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> FormField {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(index + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryForm {
    pub date: String,
    pub amount: String,
    pub category: String,
    pub remark: String,
    pub registration: String,
    pub focus: FormField,
}

impl EntryForm {
    pub fn new(today: NaiveDate, catalog: &CategoryCatalog) -> Self {
        Self {
            date: format_date(today),
            amount: String::new(),
            category: catalog.default_name().to_string(),
            remark: String::new(),
            registration: String::new(),
            focus: FormField::Amount,
        }
    }

    /// Back to the initial state: today's date and the default category.
    pub fn reset(&mut self, today: NaiveDate, catalog: &CategoryCatalog) {
        let focus = self.focus;
        *self = Self::new(today, catalog);
        self.focus = focus;
    }

    /// Resets the form, then copies every field the receipt reader found.
    ///
    /// A category unknown to the catalog keeps the default one selected.
    pub fn prefill(&mut self, receipt: &Receipt, today: NaiveDate, catalog: &CategoryCatalog) {
        self.reset(today, catalog);
        if let Some(date) = non_empty(receipt.date.as_deref()) {
            self.date = date.to_string();
        }
        if let Some(amount) = receipt.amount.filter(|a| *a != 0) {
            self.amount = amount.to_string();
        }
        if let Some(category) = non_empty(receipt.category.as_deref()) {
            if catalog.contains(category) {
                self.category = category.to_string();
            } else {
                tracing::warn!("receipt category \"{category}\" is not in the catalog");
            }
        }
        if let Some(remark) = non_empty(receipt.remark.as_deref()) {
            self.remark = remark.to_string();
        }
        if let Some(registration) = non_empty(receipt.registration.as_deref()) {
            self.registration = registration.to_string();
        }
    }

    /// Partial reset after a manual send, keeping date and category so that
    /// similar receipts are quick to add.
    pub fn clear_for_next(&mut self) {
        self.amount.clear();
        self.remark.clear();
        self.registration.clear();
        self.focus = FormField::Amount;
    }

    pub fn is_amount_blank(&self) -> bool {
        self.amount.trim().is_empty()
    }

    /// Text of the focused field, `None` for the category selector.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Date => Some(&mut self.date),
            FormField::Amount => Some(&mut self.amount),
            FormField::Category => None,
            FormField::Remark => Some(&mut self.remark),
            FormField::Registration => Some(&mut self.registration),
        }
    }

    pub fn cycle_category(&mut self, catalog: &CategoryCatalog, forward: bool) {
        self.category = catalog.cycle(&self.category, forward).to_string();
    }

    /// Validates the form and builds the request for `me`.
    pub fn build_entry(&self, me: Member, catalog: &CategoryCatalog) -> ResultEngine<EntryNew> {
        let date = parse_date(&self.date)?;
        let amount: Yen = self.amount.parse()?;
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        let class = catalog.class_of(&self.category)?;
        let amounts = split(class, amount, me);

        Ok(EntryNew {
            date,
            riku: amounts.riku.map(i64::from),
            anju: amounts.anju.map(i64::from),
            remark: self.remark.trim().to_string(),
            category: self.category.clone(),
            registration: self.registration.trim().to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(raw: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(format!("\"{}\" is not YYYY-MM-DD", raw.trim())))
}

/// Kinds of monthly bills offered by the bill dialog. Picking one fills the
/// remark with its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillCatalog(Vec<String>);

impl Default for BillCatalog {
    fn default() -> Self {
        Self(
            ["家賃", "電気", "ガス", "水道", "携帯", "ネット"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        )
    }
}

impl BillCatalog {
    pub fn new(bills: Vec<String>) -> Self {
        if bills.is_empty() {
            Self::default()
        } else {
            Self(bills)
        }
    }

    pub fn bills(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn new_form_defaults_to_today_and_first_category() {
        let form = EntryForm::new(today(), &CategoryCatalog::default());
        assert_eq!(form.date, "2024-05-01");
        assert_eq!(form.category, "日常");
        assert!(form.is_amount_blank());
    }

    #[test]
    fn prefill_copies_present_fields_only() {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today(), &catalog);
        form.remark = "leftover".to_string();

        let receipt = Receipt {
            date: Some("2024-04-21".to_string()),
            amount: Some(1234),
            registration: Some("T1234567890123".to_string()),
            category: Some("unknown".to_string()),
            remark: None,
        };
        form.prefill(&receipt, today(), &catalog);

        assert_eq!(form.date, "2024-04-21");
        assert_eq!(form.amount, "1234");
        assert_eq!(form.registration, "T1234567890123");
        assert_eq!(form.category, "日常");
        assert_eq!(form.remark, "");
    }

    #[test]
    fn prefill_without_date_keeps_today() {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today(), &catalog);
        form.prefill(
            &Receipt {
                amount: Some(0),
                category: Some("外食".to_string()),
                ..Receipt::default()
            },
            today(),
            &catalog,
        );
        assert_eq!(form.date, "2024-05-01");
        assert!(form.is_amount_blank());
        assert_eq!(form.category, "外食");
    }

    #[test]
    fn clear_for_next_keeps_date_and_category() {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today(), &catalog);
        form.date = "2024-04-30".to_string();
        form.category = "外食".to_string();
        form.amount = "900".to_string();
        form.remark = "蕎麦".to_string();
        form.registration = "T1".to_string();
        form.focus = FormField::Remark;

        form.clear_for_next();

        assert_eq!(form.date, "2024-04-30");
        assert_eq!(form.category, "外食");
        assert!(form.amount.is_empty() && form.remark.is_empty() && form.registration.is_empty());
        assert_eq!(form.focus, FormField::Amount);
    }

    #[test]
    fn build_entry_splits_by_category_class() {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today(), &catalog);
        form.amount = "1,500".to_string();
        form.category = "精算".to_string();
        form.remark = " 立替 ".to_string();

        let entry = form.build_entry(Member::Riku, &catalog).unwrap();
        assert_eq!(entry.riku, Some(-1500));
        assert_eq!(entry.anju, Some(1500));
        assert_eq!(entry.remark, "立替");
        assert_eq!(entry.date, today());
    }

    #[test]
    fn build_entry_validates_fields() {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today(), &catalog);

        form.amount = "0".to_string();
        assert!(matches!(
            form.build_entry(Member::Anju, &catalog),
            Err(EngineError::InvalidAmount(_))
        ));

        form.amount = "10".to_string();
        form.date = "21/04/2024".to_string();
        assert!(matches!(
            form.build_entry(Member::Anju, &catalog),
            Err(EngineError::InvalidDate(_))
        ));

        form.date = "2024-04-21".to_string();
        form.category = "???".to_string();
        assert_eq!(
            form.build_entry(Member::Anju, &catalog).unwrap_err(),
            EngineError::UnknownCategory("???".to_string())
        );
    }

    #[test]
    fn focus_cycles_through_every_field() {
        let mut field = FormField::Date;
        for _ in 0..FormField::ORDER.len() {
            field = field.next();
        }
        assert_eq!(field, FormField::Date);
        assert_eq!(FormField::Date.prev(), FormField::Registration);
    }
}
