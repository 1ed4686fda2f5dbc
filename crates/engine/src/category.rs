//! Categories of the ledger and how an amount is split between members.
//!
//! The server treats categories as opaque strings. Only the client knows
//! whether a category is an expense, an income or a transfer, which decides
//! how the single amount typed in the form lands in the two member columns.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Member, ResultEngine, Yen};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryClass {
    Expense,
    Income,
    Transfer,
}

impl CategoryClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Expense => "支出",
            Self::Income => "収入",
            Self::Transfer => "振替",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub class: CategoryClass,
}

impl Category {
    pub fn new(name: &str, class: CategoryClass) -> Self {
        Self {
            name: name.to_string(),
            class,
        }
    }
}

/// Ordered list of categories offered by the form. The first one is selected
/// after a reset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog(Vec<Category>);

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self(vec![
            Category::new("日常", CategoryClass::Expense),
            Category::new("外食", CategoryClass::Expense),
            Category::new("月額", CategoryClass::Expense),
            Category::new("特別", CategoryClass::Expense),
            Category::new("給料", CategoryClass::Income),
            Category::new("臨時収入", CategoryClass::Income),
            Category::new("精算", CategoryClass::Transfer),
        ])
    }
}

impl CategoryCatalog {
    /// Builds a catalog, falling back to the default one when empty.
    pub fn new(categories: Vec<Category>) -> Self {
        if categories.is_empty() {
            Self::default()
        } else {
            Self(categories)
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    pub fn default_name(&self) -> &str {
        self.0.first().map(|c| c.name.as_str()).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn class_of(&self, name: &str) -> ResultEngine<CategoryClass> {
        self.get(name)
            .map(|c| c.class)
            .ok_or_else(|| EngineError::UnknownCategory(name.to_string()))
    }

    /// Returns the category after (or before) `current`, wrapping around.
    pub fn cycle(&self, current: &str, forward: bool) -> &str {
        if self.0.is_empty() {
            return "";
        }
        let len = self.0.len();
        let next = match self.0.iter().position(|c| c.name == current) {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None => 0,
        };
        &self.0[next].name
    }
}

/// Per-member amounts of an entry. `None` means the member is not involved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Amounts {
    pub riku: Option<Yen>,
    pub anju: Option<Yen>,
}

impl Amounts {
    pub fn get(&self, member: Member) -> Option<Yen> {
        match member {
            Member::Riku => self.riku,
            Member::Anju => self.anju,
        }
    }

    fn set(&mut self, member: Member, value: Option<Yen>) {
        match member {
            Member::Riku => self.riku = value,
            Member::Anju => self.anju = value,
        }
    }
}

/// Splits the amount typed by `me` according to the category class.
///
/// - expense: `me` pays, the partner is not involved;
/// - income: `me` gains, the partner is not involved;
/// - transfer: `me` gives the amount to the partner.
pub fn split(class: CategoryClass, amount: Yen, me: Member) -> Amounts {
    let mut amounts = Amounts::default();
    match class {
        CategoryClass::Expense => amounts.set(me, Some(-amount)),
        CategoryClass::Income => amounts.set(me, Some(amount)),
        CategoryClass::Transfer => {
            amounts.set(me, Some(-amount));
            amounts.set(me.other(), Some(amount));
        }
    }
    amounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_expense_only_touches_me() {
        let amounts = split(CategoryClass::Expense, Yen::new(800), Member::Riku);
        assert_eq!(amounts.riku, Some(Yen::new(-800)));
        assert_eq!(amounts.anju, None);
    }

    #[test]
    fn split_income_is_positive() {
        let amounts = split(CategoryClass::Income, Yen::new(300_000), Member::Anju);
        assert_eq!(amounts.anju, Some(Yen::new(300_000)));
        assert_eq!(amounts.riku, None);
    }

    #[test]
    fn split_transfer_moves_money_to_partner() {
        let amounts = split(CategoryClass::Transfer, Yen::new(5000), Member::Anju);
        assert_eq!(amounts.anju, Some(Yen::new(-5000)));
        assert_eq!(amounts.riku, Some(Yen::new(5000)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let catalog = CategoryCatalog::default();
        assert_eq!(catalog.class_of("月額").unwrap(), CategoryClass::Expense);
        assert_eq!(
            catalog.class_of("casino").unwrap_err(),
            EngineError::UnknownCategory("casino".to_string())
        );
    }

    #[test]
    fn cycle_wraps_both_ways() {
        let catalog = CategoryCatalog::new(vec![
            Category::new("a", CategoryClass::Expense),
            Category::new("b", CategoryClass::Income),
        ]);
        assert_eq!(catalog.cycle("a", true), "b");
        assert_eq!(catalog.cycle("b", true), "a");
        assert_eq!(catalog.cycle("a", false), "b");
        assert_eq!(catalog.cycle("zzz", true), "a");
    }

    #[test]
    fn empty_catalog_falls_back_to_default() {
        assert_eq!(CategoryCatalog::new(Vec::new()), CategoryCatalog::default());
        assert_eq!(CategoryCatalog::default().default_name(), "日常");
    }
}
