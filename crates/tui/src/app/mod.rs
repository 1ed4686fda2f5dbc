use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use api_types::{
    entry::{EntryId, EntryNew},
    receipt::Receipt,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use client::{Client, ClientError};
use crossterm::event::{self, Event, KeyEventKind};
use engine::{Credentials, EntryMode, FormField, Session};
use tokio::sync::mpsc;

use crate::{
    config::{self, AppConfig},
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Picture,
    Bills,
    History,
}

#[derive(Debug, Default)]
pub struct LoginState {
    pub input: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub login: LoginState,
    pub session: Option<Session>,
    pub overlay: Option<Overlay>,
    pub picture_path: String,
    pub bill_selected: usize,
    pub history_selected: usize,
    pub downloading: bool,
    pub toast: Option<ToastState>,
    pub base_url: String,
}

/// Completion of a request running in the background.
#[derive(Debug)]
pub enum AppEvent {
    Uploaded(client::Result<Vec<Receipt>>),
    Sent {
        entry: EntryNew,
        result: client::Result<EntryId>,
    },
    Withdrawn {
        index: usize,
        result: client::Result<()>,
    },
    Downloaded(client::Result<PathBuf>),
}

pub struct App {
    config: AppConfig,
    tz: Tz,
    client: Option<Client>,
    pub state: AppState,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let tz = config.timezone()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState {
            screen: Screen::Login,
            login: LoginState {
                input: config.credentials.clone(),
                message: None,
            },
            session: None,
            overlay: None,
            picture_path: String::new(),
            bill_selected: 0,
            history_selected: 0,
            downloading: false,
            toast: None,
            base_url: config.base_url.clone(),
        };

        let mut app = Self {
            config,
            tz,
            client: None,
            state,
            tx,
            rx,
            should_quit: false,
        };
        if !app.config.credentials.trim().is_empty() {
            let raw = app.config.credentials.clone();
            app.login(&raw);
        }
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(100);

        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_action(map_key(key));
                    }
                    Event::FocusGained => self.focus_gained(),
                    _ => {}
                }
            }

            while let Ok(app_event) = self.rx.try_recv() {
                self.handle_app_event(app_event);
            }
            self.expire_toast(Instant::now());
        }

        Ok(())
    }

    fn today(&self) -> NaiveDate {
        config::today(self.tz)
    }

    fn login(&mut self, raw: &str) {
        match self.start_session(raw) {
            Ok(()) => {
                self.state.screen = Screen::Entry;
                self.state.login = LoginState::default();
                tracing::info!("session started for {}", raw.split(':').next().unwrap_or(""));
            }
            Err(err) => {
                tracing::warn!("login failed: {err}");
                self.state.screen = Screen::Login;
                self.state.login.message = Some(err.to_string());
            }
        }
    }

    fn start_session(&mut self, raw: &str) -> Result<()> {
        let credentials = Credentials::parse(raw)?;
        let client = Client::new(&self.config.base_url, &credentials)?;

        // Logging in again after a rejected key keeps the running session.
        if let Some(session) = self.state.session.as_mut() {
            session.set_credentials(credentials);
            self.client = Some(client);
            return Ok(());
        }

        let session = Session::builder()
            .credentials(credentials)
            .catalog(self.config.catalog())
            .bills(self.config.bills())
            .idle_reset(self.config.idle_reset())
            .build(self.today(), Utc::now())?;
        self.client = Some(client);
        self.state.session = Some(session);
        Ok(())
    }

    fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        match (self.state.screen, self.state.overlay) {
            (Screen::Login, _) => self.handle_login(action),
            (Screen::Entry, None) => self.handle_entry(action),
            (Screen::Entry, Some(Overlay::Picture)) => self.handle_picture(action),
            (Screen::Entry, Some(Overlay::Bills)) => self.handle_bills(action),
            (Screen::Entry, Some(Overlay::History)) => self.handle_history(action),
        }
    }

    fn handle_login(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.state.login.input.push(ch),
            AppAction::Backspace => {
                self.state.login.input.pop();
            }
            AppAction::Submit => {
                let raw = self.state.login.input.clone();
                self.login(&raw);
            }
            AppAction::Cancel => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_entry(&mut self, action: AppAction) {
        match action {
            AppAction::Submit => return self.send(),
            AppAction::Download => return self.download(),
            AppAction::Upload => return self.open_overlay(Overlay::Picture),
            AppAction::Bills => return self.open_overlay(Overlay::Bills),
            AppAction::History => return self.open_overlay(Overlay::History),
            _ => {}
        }

        let today = self.today();
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        let focus = session.form().focus;
        match action {
            AppAction::NextField | AppAction::Down => session.form_mut().focus = focus.next(),
            AppAction::PrevField | AppAction::Up => session.form_mut().focus = focus.prev(),
            AppAction::Left | AppAction::Right if focus == FormField::Category => {
                session.cycle_category(action == AppAction::Right);
            }
            AppAction::Input(ch) => match session.form_mut().focused_text_mut() {
                Some(text) => text.push(ch),
                None if ch == ' ' => session.cycle_category(true),
                None => {}
            },
            AppAction::Backspace => {
                if let Some(text) = session.form_mut().focused_text_mut() {
                    text.pop();
                }
            }
            AppAction::Clear => match session.mode() {
                EntryMode::Queue => {
                    session.discard(today);
                    self.toast(ToastLevel::Info, "破棄しました");
                }
                EntryMode::Manual => session.clear(today),
            },
            _ => {}
        }
    }

    fn open_overlay(&mut self, overlay: Overlay) {
        match overlay {
            Overlay::Picture => {
                if self.state.session.as_ref().is_some_and(Session::is_uploading) {
                    self.toast(ToastLevel::Info, "アップロード中です");
                    return;
                }
                self.state.picture_path.clear();
            }
            Overlay::Bills => self.state.bill_selected = 0,
            Overlay::History => self.state.history_selected = 0,
        }
        self.state.overlay = Some(overlay);
    }

    fn handle_picture(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.state.picture_path.push(ch),
            AppAction::Backspace => {
                self.state.picture_path.pop();
            }
            AppAction::Cancel => self.state.overlay = None,
            AppAction::Submit => {
                let raw = self.state.picture_path.trim().trim_matches(['"', '\'']);
                if raw.is_empty() {
                    return;
                }
                let path = expand_home(raw);
                self.state.overlay = None;
                self.upload(path);
            }
            _ => {}
        }
    }

    fn handle_bills(&mut self, action: AppAction) {
        let count = self
            .state
            .session
            .as_ref()
            .map_or(0, |session| session.bills().bills().len());
        let chosen = match action {
            AppAction::Up => {
                self.state.bill_selected = self.state.bill_selected.saturating_sub(1);
                None
            }
            AppAction::Down => {
                self.state.bill_selected = (self.state.bill_selected + 1).min(count.saturating_sub(1));
                None
            }
            AppAction::Input(ch) => ch
                .to_digit(10)
                .filter(|d| *d > 0)
                .map(|d| d as usize - 1),
            AppAction::Submit => Some(self.state.bill_selected),
            AppAction::Cancel | AppAction::Bills => {
                self.state.overlay = None;
                None
            }
            _ => None,
        };

        if let Some(index) = chosen
            && let Some(session) = self.state.session.as_mut()
            && session.choose_bill(index)
        {
            self.state.overlay = None;
        }
    }

    fn handle_history(&mut self, action: AppAction) {
        let len = self
            .state
            .session
            .as_ref()
            .map_or(0, |session| session.history().len());
        match action {
            AppAction::Up => {
                self.state.history_selected = self.state.history_selected.saturating_sub(1);
            }
            AppAction::Down => {
                self.state.history_selected =
                    (self.state.history_selected + 1).min(len.saturating_sub(1));
            }
            AppAction::Submit | AppAction::Input('w') => {
                if let Some(index) = history_row_index(len, self.state.history_selected) {
                    self.withdraw(index);
                }
            }
            AppAction::Input('d') | AppAction::Download => self.download(),
            AppAction::Cancel | AppAction::History => self.state.overlay = None,
            _ => {}
        }
    }

    fn upload(&mut self, path: PathBuf) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        if !session.begin_upload() {
            return;
        }

        tracing::info!("uploading {}", path.display());
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.upload(&path).await;
            let _ = tx.send(AppEvent::Uploaded(result));
        });
    }

    fn send(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        let entry = match session.begin_send() {
            Ok(Some(entry)) => entry,
            Ok(None) => return,
            Err(err) => {
                self.toast(ToastLevel::Error, err.to_string());
                return;
            }
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.send(&entry).await;
            let _ = tx.send(AppEvent::Sent { entry, result });
        });
    }

    fn withdraw(&mut self, index: usize) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(id) = self
            .state
            .session
            .as_mut()
            .and_then(|session| session.begin_withdraw(index))
        else {
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.withdraw(&id).await;
            let _ = tx.send(AppEvent::Withdrawn { index, result });
        });
    }

    fn download(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };
        if self.state.downloading {
            return;
        }
        self.state.downloading = true;

        let dir = self.config.download_dir.clone();
        let today = self.today();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.download(&dir, today).await;
            let _ = tx.send(AppEvent::Downloaded(result));
        });
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        let today = self.today();
        let Some(session) = self.state.session.as_mut() else {
            return;
        };

        match event {
            AppEvent::Uploaded(Ok(receipts)) => {
                let count = receipts.len();
                session.upload_succeeded(receipts, today);
                if count == 0 {
                    self.toast(ToastLevel::Info, "レシートが見つかりませんでした");
                } else {
                    self.toast(ToastLevel::Success, format!("{count} 枚読み取りました"));
                }
            }
            AppEvent::Uploaded(Err(err)) => {
                session.upload_failed();
                self.fail("upload", err);
            }
            AppEvent::Sent {
                entry,
                result: Ok(id),
            } => {
                session.entry_sent(entry, id, today);
                self.toast(ToastLevel::Success, "✈ 送信しました");
            }
            AppEvent::Sent { result: Err(err), .. } => {
                session.send_failed();
                self.fail("send", err);
            }
            AppEvent::Withdrawn { index, result } => {
                session.withdraw_finished(index, result.is_ok());
                match result {
                    Ok(()) => self.toast(ToastLevel::Success, "取り消しました"),
                    Err(err) => self.fail("withdraw", err),
                }
            }
            AppEvent::Downloaded(result) => {
                self.state.downloading = false;
                match result {
                    Ok(path) => {
                        self.toast(ToastLevel::Success, format!("保存しました: {}", path.display()));
                    }
                    Err(err) => self.fail("download", err),
                }
            }
        }
    }

    fn fail(&mut self, what: &str, err: ClientError) {
        tracing::error!("{what} failed: {err}");
        if err.is_unauthorized() {
            self.state.overlay = None;
            self.state.screen = Screen::Login;
            self.state.login.message = Some("API キーが拒否されました".to_string());
            return;
        }
        self.toast(ToastLevel::Error, err.to_string());
    }

    fn focus_gained(&mut self) {
        let today = self.today();
        if let Some(session) = self.state.session.as_mut() {
            session.focus_gained(Utc::now(), today);
        }
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    fn expire_toast(&mut self, now: Instant) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.state.toast = None;
        }
    }
}

/// The history overlay lists the newest entry first. Maps a selected line to
/// the index of the row in the session history.
pub fn history_row_index(len: usize, selected: usize) -> Option<usize> {
    (selected < len).then(|| len - 1 - selected)
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(credentials: &str) -> AppConfig {
        AppConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            credentials: credentials.to_string(),
            ..AppConfig::default()
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_action(AppAction::Input(ch));
        }
    }

    fn session(app: &App) -> &Session {
        app.state.session.as_ref().unwrap()
    }

    fn entry() -> EntryNew {
        EntryNew {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            riku: Some(-100),
            anju: None,
            remark: String::new(),
            category: "日常".to_string(),
            registration: String::new(),
        }
    }

    #[test]
    fn missing_credentials_show_login() {
        let mut app = App::new(config("")).unwrap();
        assert_eq!(app.state.screen, Screen::Login);

        type_text(&mut app, "anju:k3y");
        app.handle_action(AppAction::Submit);

        assert_eq!(app.state.screen, Screen::Entry);
        assert_eq!(session(&app).me(), engine::Member::Anju);
        assert!(app.state.login.input.is_empty());
    }

    #[test]
    fn invalid_credentials_stay_on_login() {
        let mut app = App::new(config("bob:k3y")).unwrap();
        assert_eq!(app.state.screen, Screen::Login);
        assert!(app.state.login.message.is_some());
        assert!(app.state.session.is_none());
    }

    #[test]
    fn typing_edits_focused_field() {
        let mut app = App::new(config("riku:k")).unwrap();
        type_text(&mut app, "1200");
        assert_eq!(session(&app).form().amount, "1200");

        app.handle_action(AppAction::Backspace);
        app.handle_action(AppAction::NextField);
        app.handle_action(AppAction::Right);
        type_text(&mut app, "x");

        let form = session(&app).form();
        assert_eq!(form.amount, "120");
        assert_eq!(form.focus, FormField::Category);
        assert_eq!(form.category, "外食");
    }

    #[test]
    fn uploaded_receipts_fill_form() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.handle_app_event(AppEvent::Uploaded(Ok(vec![
            Receipt {
                amount: Some(500),
                ..Receipt::default()
            },
            Receipt::default(),
        ])));

        assert_eq!(session(&app).form().amount, "500");
        assert_eq!(session(&app).queue_counter().as_deref(), Some("あと 1 枚"));
        assert_eq!(
            app.state.toast.as_ref().map(|t| t.level),
            Some(ToastLevel::Success)
        );

        app.handle_action(AppAction::Clear);
        assert!(session(&app).form().is_amount_blank());
        assert_eq!(session(&app).queue_counter().as_deref(), Some("あと 0 枚"));
    }

    #[test]
    fn rejected_key_goes_back_to_login() {
        let mut app = App::new(config("riku:wrong")).unwrap();
        app.state.overlay = Some(Overlay::History);
        app.handle_app_event(AppEvent::Sent {
            entry: entry(),
            result: Err(ClientError::Unauthorized),
        });

        assert_eq!(app.state.screen, Screen::Login);
        assert_eq!(app.state.overlay, None);
        assert!(session(&app).history().is_empty());
    }

    #[test]
    fn login_after_rejected_key_keeps_session() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.handle_app_event(AppEvent::Sent {
            entry: entry(),
            result: Ok(EntryId::Number(1)),
        });
        app.handle_app_event(AppEvent::Uploaded(Ok(vec![
            Receipt {
                amount: Some(500),
                ..Receipt::default()
            },
            Receipt {
                amount: Some(700),
                ..Receipt::default()
            },
        ])));
        app.handle_app_event(AppEvent::Sent {
            entry: entry(),
            result: Err(ClientError::Unauthorized),
        });
        assert_eq!(app.state.screen, Screen::Login);

        type_text(&mut app, "riku:k2");
        app.handle_action(AppAction::Submit);

        assert_eq!(app.state.screen, Screen::Entry);
        let session = session(&app);
        assert_eq!(session.credentials().api_key, "k2");
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.queue().len(), 1);
        assert_eq!(session.form().amount, "500");
    }

    #[test]
    fn sent_entry_lands_in_history() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.handle_app_event(AppEvent::Sent {
            entry: entry(),
            result: Ok(EntryId::Number(1)),
        });
        assert_eq!(session(&app).history().len(), 1);
        assert_eq!(
            app.state.toast.as_ref().map(|t| t.message.as_str()),
            Some("✈ 送信しました")
        );
    }

    #[test]
    fn bill_dialog_picks_by_number() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.handle_action(AppAction::Bills);
        assert_eq!(app.state.overlay, Some(Overlay::Bills));

        app.handle_action(AppAction::Input('2'));
        assert_eq!(app.state.overlay, None);
        assert_eq!(session(&app).form().remark, "電気");
    }

    #[tokio::test]
    async fn send_marks_request_in_flight() {
        let mut app = App::new(config("riku:k")).unwrap();
        type_text(&mut app, "300");
        app.handle_action(AppAction::Submit);
        assert!(session(&app).is_sending());

        // A second submit while waiting is ignored.
        app.handle_action(AppAction::Submit);
        assert!(session(&app).is_sending());
    }

    #[test]
    fn invalid_form_shows_error_toast() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.handle_action(AppAction::Submit);
        assert_eq!(
            app.state.toast.as_ref().map(|t| t.level),
            Some(ToastLevel::Error)
        );
        assert!(!session(&app).is_sending());
    }

    #[test]
    fn toast_expires() {
        let mut app = App::new(config("riku:k")).unwrap();
        app.toast(ToastLevel::Info, "x");
        app.expire_toast(Instant::now());
        assert!(app.state.toast.is_some());
        app.expire_toast(Instant::now() + TOAST_DURATION);
        assert!(app.state.toast.is_none());
    }

    #[test]
    fn history_is_listed_newest_first() {
        assert_eq!(history_row_index(3, 0), Some(2));
        assert_eq!(history_row_index(3, 2), Some(0));
        assert_eq!(history_row_index(3, 3), None);
        assert_eq!(history_row_index(0, 0), None);
    }
}
