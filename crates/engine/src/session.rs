//! The client session: the glue between the receipt queue, the entry form
//! and the history.
//!
//! A session is in one of two modes:
//!
//! - [`EntryMode::Manual`]: the user types entries by hand and the form offers
//!   a *clear* action.
//! - [`EntryMode::Queue`]: the form shows a receipt read from a picture, the
//!   *clear* action becomes *discard* and the number of receipts left is
//!   displayed.
//!
//! Every time a receipt is sent or discarded, the next one fills the form.
//!
//! The session never performs IO. Front-ends call the `begin_*` method before
//! a request and the matching completion method once the server answered.

use api_types::{
    entry::{EntryId, EntryNew},
    receipt::Receipt,
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::{
    BillCatalog, CategoryCatalog, Credentials, EntryForm, FormField, History, Member,
    ReceiptQueue, ResultEngine,
};

/// Default inactivity after which a blank form is reset to today.
pub const DEFAULT_IDLE_RESET: TimeDelta = TimeDelta::hours(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryMode {
    Manual,
    Queue,
}

#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    catalog: CategoryCatalog,
    bills: BillCatalog,
    form: EntryForm,
    queue: ReceiptQueue,
    history: History,
    mode: EntryMode,
    idle_reset: TimeDelta,
    last_focus: DateTime<Utc>,
    uploading: bool,
    sending: bool,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn me(&self) -> Member {
        self.credentials.me
    }

    pub fn you(&self) -> Member {
        self.credentials.you()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Swaps the credentials after the ledger rejected the previous key.
    /// The form, the queue and the history are kept.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        tracing::info!("credentials replaced for {}", credentials.me);
        self.credentials = credentials;
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn bills(&self) -> &BillCatalog {
        &self.bills
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntryForm {
        &mut self.form
    }

    pub fn queue(&self) -> &ReceiptQueue {
        &self.queue
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Remaining receipts label shown in queue mode, e.g. `あと 2 枚`.
    pub fn queue_counter(&self) -> Option<String> {
        match self.mode {
            EntryMode::Queue => Some(format!("あと {} 枚", self.queue.len())),
            EntryMode::Manual => None,
        }
    }

    /// Fills the form with the next pending receipt.
    ///
    /// Returns `false`, and goes back to manual mode, when the queue is empty.
    pub fn shift_receipt(&mut self, today: NaiveDate) -> bool {
        let Some(receipt) = self.queue.shift() else {
            self.mode = EntryMode::Manual;
            return false;
        };
        self.form.prefill(&receipt, today, &self.catalog);
        self.mode = EntryMode::Queue;
        tracing::debug!("receipt loaded, {} left", self.queue.len());
        true
    }

    /// Marks an upload in flight. Returns `false` when one already is.
    pub fn begin_upload(&mut self) -> bool {
        if self.uploading {
            return false;
        }
        self.uploading = true;
        true
    }

    /// Queues the receipts read from a picture. The first one goes straight
    /// to the form unless a receipt is already being edited.
    pub fn upload_succeeded(&mut self, receipts: Vec<Receipt>, today: NaiveDate) {
        self.uploading = false;
        let count = receipts.len();
        let busy = self.mode == EntryMode::Queue;
        self.queue.extend(receipts);
        tracing::info!("{count} receipt(s) queued, {} pending", self.queue.len());
        if !busy {
            self.shift_receipt(today);
        }
    }

    pub fn upload_failed(&mut self) {
        self.uploading = false;
    }

    /// Abandons the receipt shown in the form and loads the next one.
    pub fn discard(&mut self, today: NaiveDate) -> bool {
        if self.mode != EntryMode::Queue {
            return false;
        }
        self.shift_receipt(today)
    }

    /// Full reset of a manually typed entry.
    pub fn clear(&mut self, today: NaiveDate) {
        if self.mode == EntryMode::Manual {
            self.form.reset(today, &self.catalog);
            self.form.focus = FormField::Amount;
        }
    }

    pub fn cycle_category(&mut self, forward: bool) {
        self.form.cycle_category(&self.catalog, forward);
    }

    /// Fills the remark with the bill chosen in the bill dialog.
    pub fn choose_bill(&mut self, index: usize) -> bool {
        match self.bills.get(index) {
            Some(bill) => {
                self.form.remark = bill.to_string();
                true
            }
            None => false,
        }
    }

    /// Validates the form and marks a send in flight.
    ///
    /// Returns `Ok(None)` while a previous send has not completed.
    pub fn begin_send(&mut self) -> ResultEngine<Option<EntryNew>> {
        if self.sending {
            return Ok(None);
        }
        let entry = self.form.build_entry(self.me(), &self.catalog)?;
        self.sending = true;
        Ok(Some(entry))
    }

    /// Records a sent entry, shares its store with pending receipts and moves
    /// on to the next receipt. Returns the history index of the entry.
    pub fn entry_sent(&mut self, entry: EntryNew, id: EntryId, today: NaiveDate) -> usize {
        self.sending = false;
        let registration = entry.registration.clone();
        let category = entry.category.clone();
        let remark = entry.remark.clone();

        tracing::info!("entry {id} recorded");
        let index = self.history.push(entry, id);

        if !registration.is_empty() {
            let shared = self.queue.share_store(&registration, &category, &remark);
            if shared > 0 {
                tracing::debug!("store {registration} shared with {shared} pending receipt(s)");
            }
        }

        if !self.shift_receipt(today) {
            self.form.clear_for_next();
        }
        index
    }

    /// The form is left untouched so the user can retry.
    pub fn send_failed(&mut self) {
        self.sending = false;
    }

    pub fn begin_withdraw(&mut self, index: usize) -> Option<EntryId> {
        self.history.begin_withdraw(index)
    }

    pub fn withdraw_finished(&mut self, index: usize, succeeded: bool) {
        self.history.finish_withdraw(index, succeeded);
    }

    /// Called when the front-end comes back to the foreground.
    ///
    /// After a long inactivity with nothing typed and nothing queued, the
    /// form is reset so it shows today's date and the default category.
    /// Focus then goes to the amount, where every entry starts.
    pub fn focus_gained(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        let idle = now - self.last_focus;
        if idle > self.idle_reset && self.form.is_amount_blank() && self.queue.is_empty() {
            tracing::debug!("idle for {}s, resetting form", idle.num_seconds());
            self.form.reset(today, &self.catalog);
        }
        self.last_focus = now;

        if self.form.is_amount_blank() {
            self.form.focus = FormField::Amount;
        }
    }
}

#[derive(Default)]
pub struct SessionBuilder {
    credentials: Option<Credentials>,
    catalog: Option<CategoryCatalog>,
    bills: Option<BillCatalog>,
    idle_reset: Option<TimeDelta>,
}

impl SessionBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn catalog(mut self, catalog: CategoryCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn bills(mut self, bills: BillCatalog) -> Self {
        self.bills = Some(bills);
        self
    }

    pub fn idle_reset(mut self, idle_reset: TimeDelta) -> Self {
        self.idle_reset = Some(idle_reset);
        self
    }

    /// Builds the session with an empty queue and history, the form set to
    /// `today`, and `now` as the last focus time.
    pub fn build(self, today: NaiveDate, now: DateTime<Utc>) -> ResultEngine<Session> {
        let credentials = self.credentials.ok_or(crate::EngineError::MissingApiKey)?;
        let catalog = self.catalog.unwrap_or_default();
        let form = EntryForm::new(today, &catalog);
        Ok(Session {
            credentials,
            catalog,
            bills: self.bills.unwrap_or_default(),
            form,
            queue: ReceiptQueue::new(),
            history: History::new(),
            mode: EntryMode::Manual,
            idle_reset: self.idle_reset.unwrap_or(DEFAULT_IDLE_RESET),
            last_focus: now,
            uploading: false,
            sending: false,
        })
    }
}
