//! Client-side logic of the household ledger.
//!
//! Nothing in this crate performs IO: the front-ends drive a [`Session`] and
//! talk to the ledger API through the `client` crate.

pub use category::{Amounts, Category, CategoryCatalog, CategoryClass, split};
pub use error::EngineError;
pub use form::{BillCatalog, EntryForm, FormField, format_date, parse_date};
pub use history::{History, HistoryRow, RowStatus, date_label};
pub use member::{Credentials, Member};
pub use queue::ReceiptQueue;
pub use report::{
    BILL_CATEGORY, Finding, Report, ReportRow, SALARY_CATEGORY, Settlement, Summary,
};
pub use session::{DEFAULT_IDLE_RESET, EntryMode, Session, SessionBuilder};
pub use yen::Yen;

mod category;
mod error;
mod form;
mod history;
mod member;
mod queue;
mod report;
mod session;
mod yen;

pub type ResultEngine<T> = Result<T, EngineError>;
