use std::{error::Error, fs::File, future::Future, io::Write, path::PathBuf};

use api_types::{
    entry::{EntryId, EntryNew},
    receipt::Receipt,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use client::{Client, ClientError};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{CategoryCatalog, Credentials, EngineError, EntryForm, Member, Report};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "kakeibo")]
#[command(about = "Command line client of the household ledger")]
struct Cli {
    /// Ledger base URL (also read from `KAKEIBO_BASE_URL`).
    #[arg(long, env = "KAKEIBO_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Who is sending: `riku` or `anju`.
    #[arg(long, env = "KAKEIBO_USER")]
    user: Option<Member>,

    /// API key. Asked for on the terminal when missing.
    #[arg(long, env = "KAKEIBO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Timezone deciding what "today" is (IANA name).
    #[arg(long, env = "KAKEIBO_TIMEZONE", default_value = "Asia/Tokyo")]
    timezone: String,

    #[arg(long, env = "KAKEIBO_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload receipt pictures and print what the server read from them.
    Upload(UploadArgs),
    /// Record an entry.
    Send(SendArgs),
    /// Withdraw a previously sent entry.
    Withdraw {
        /// Id printed by `send`.
        id: String,
    },
    /// Download the report as a TSV file.
    Download {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print member totals and who owes what.
    Summarize {
        /// Report downloaded with `download`.
        report: PathBuf,
    },
    /// Look for duplicated rows and missing or repeated monthly payments.
    Validate {
        /// Report downloaded with `download`.
        report: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Tsv,
}

#[derive(Args, Debug)]
struct UploadArgs {
    #[arg(required = true)]
    pictures: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// `YYYY-MM-DD`, today when omitted.
    #[arg(long)]
    date: Option<String>,
    /// Positive amount in yen; the category decides the sign.
    #[arg(long)]
    amount: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    remark: String,
    /// Invoice registration number of the store.
    #[arg(long, default_value = "")]
    registration: String,
}

impl SendArgs {
    fn to_entry(&self, me: Member, today: NaiveDate) -> Result<EntryNew, EngineError> {
        let catalog = CategoryCatalog::default();
        let mut form = EntryForm::new(today, &catalog);
        if let Some(date) = &self.date {
            form.date = date.clone();
        }
        form.amount = self.amount.clone();
        form.category = self.category.clone();
        form.remark = self.remark.clone();
        form.registration = self.registration.clone();
        form.build_entry(me, &catalog)
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_secret(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn connect(cli: &Cli) -> CliResult<(Client, Member)> {
    let me = cli
        .user
        .ok_or("missing --user (or KAKEIBO_USER): riku or anju")?;
    let api_key = match &cli.api_key {
        Some(key) => key.clone(),
        None => prompt_secret("API key: ")?,
    };
    let credentials = Credentials::parse(&format!("{me}:{api_key}"))?;
    tracing::debug!("using {} as {me}", cli.base_url);
    Ok((Client::new(&cli.base_url, &credentials)?, me))
}

/// Uploads the pictures in order and stops at the first failure. Receipts
/// read before the failure are returned along with it.
async fn upload_all<F, Fut>(
    pictures: &[PathBuf],
    mut upload: F,
) -> (Vec<Receipt>, Option<(PathBuf, ClientError)>)
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = client::Result<Vec<Receipt>>>,
{
    let mut receipts = Vec::new();
    for picture in pictures {
        match upload(picture.clone()).await {
            Ok(read) => receipts.extend(read),
            Err(err) => return (receipts, Some((picture.clone(), err))),
        }
    }
    (receipts, None)
}

fn receipts_tsv(receipts: &[Receipt]) -> String {
    let mut out = String::from("日付\t金額\t部類\t備考\t登録番号\n");
    for receipt in receipts {
        let fields = [
            receipt.date.clone().unwrap_or_default(),
            receipt.amount.map(|a| a.to_string()).unwrap_or_default(),
            receipt.category.clone().unwrap_or_default(),
            receipt.remark.clone().unwrap_or_default(),
            receipt.registration.clone().unwrap_or_default(),
        ];
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kakeibo={level},client={level},engine={level}",
            level = cli.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|_| format!("unknown timezone: {}", cli.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();

    match &cli.command {
        Command::Upload(args) => {
            let (client, _) = connect(&cli)?;
            let (receipts, failure) = upload_all(&args.pictures, |picture| {
                let client = client.clone();
                async move { client.upload(&picture).await }
            })
            .await;
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&receipts)?),
                Format::Tsv => print!("{}", receipts_tsv(&receipts)),
            }
            if let Some((picture, err)) = failure {
                return Err(format!("{}: {err}", picture.display()).into());
            }
        }
        Command::Send(args) => {
            let (client, me) = connect(&cli)?;
            let entry = args.to_entry(me, today)?;
            let id = client.send(&entry).await?;
            println!("{id}");
        }
        Command::Withdraw { id } => {
            let (client, _) = connect(&cli)?;
            client.withdraw(&EntryId::from(id.as_str())).await?;
            println!("withdrawn: {id}");
        }
        Command::Download { dir } => {
            let (client, _) = connect(&cli)?;
            let path = client.download(dir, today).await?;
            println!("{}", path.display());
        }
        Command::Summarize { report } => {
            let report = Report::from_tsv(File::open(report)?)?;
            println!("{}", report.summarize()?);
        }
        Command::Validate { report } => {
            let report = Report::from_tsv(File::open(report)?)?;
            let findings = report.validate();
            if findings.is_empty() {
                println!("no issues found");
                return Ok(());
            }
            for finding in &findings {
                println!("{finding}");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn send_args_parse_into_entry() {
        let cli = Cli::try_parse_from([
            "kakeibo",
            "--user",
            "anju",
            "--api-key",
            "k",
            "send",
            "--amount",
            "2,000",
            "--category",
            "精算",
            "--remark",
            "立替",
        ])
        .unwrap();
        assert_eq!(cli.user, Some(Member::Anju));

        let Command::Send(args) = &cli.command else {
            panic!("expected send");
        };
        let entry = args.to_entry(Member::Anju, today()).unwrap();
        assert_eq!(entry.date, today());
        assert_eq!(entry.anju, Some(-2000));
        assert_eq!(entry.riku, Some(2000));
        assert_eq!(entry.remark, "立替");
    }

    #[test]
    fn send_rejects_unknown_category() {
        let args = SendArgs {
            date: Some("2024-04-01".to_string()),
            amount: "100".to_string(),
            category: "casino".to_string(),
            remark: String::new(),
            registration: String::new(),
        };
        assert_eq!(
            args.to_entry(Member::Riku, today()).unwrap_err(),
            EngineError::UnknownCategory("casino".to_string())
        );
    }

    #[test]
    fn unknown_user_is_rejected_by_clap() {
        let parsed = Cli::try_parse_from(["kakeibo", "--user", "bob", "download"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn upload_requires_a_picture() {
        assert!(Cli::try_parse_from(["kakeibo", "upload"]).is_err());
        let cli = Cli::try_parse_from(["kakeibo", "upload", "a.jpg", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Upload(UploadArgs {
                format: Format::Json,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn upload_keeps_receipts_read_before_a_failure() {
        let pictures = [
            PathBuf::from("a.jpg"),
            PathBuf::from("b.jpg"),
            PathBuf::from("c.jpg"),
        ];
        let mut seen = Vec::new();
        let (receipts, failure) = upload_all(&pictures, |picture| {
            seen.push(picture.clone());
            async move {
                if picture.ends_with("b.jpg") {
                    return Err(ClientError::Io(std::io::Error::from(
                        std::io::ErrorKind::NotFound,
                    )));
                }
                Ok(vec![Receipt {
                    amount: Some(100),
                    ..Receipt::default()
                }])
            }
        })
        .await;

        assert_eq!(receipts.len(), 1);
        let (picture, err) = failure.unwrap();
        assert_eq!(picture, PathBuf::from("b.jpg"));
        assert!(matches!(err, ClientError::Io(_)));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn receipts_as_tsv_leave_missing_fields_empty() {
        let tsv = receipts_tsv(&[Receipt {
            date: Some("2024-04-21".to_string()),
            amount: Some(980),
            ..Receipt::default()
        }]);
        assert_eq!(tsv, "日付\t金額\t部類\t備考\t登録番号\n2024-04-21\t980\t\t\t\n");
    }
}
