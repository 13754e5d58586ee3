//! Line-oriented chat loop on stdin/stdout.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

use s2h_chat::records::fetch_history_from;
use s2h_chat::{IdentitySource, RecordStore, SessionController, TurnOutcome};

use crate::pending::{PendingWrites, FLUSH_TIMEOUT};
use crate::render;

pub type InputLines = Lines<BufReader<Stdin>>;

pub fn input_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// What one line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Say(&'a str),
    New,
    Retry,
    Name(&'a str),
    History,
    Help,
    Quit,
    Unknown(&'a str),
}

pub fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line);
    };
    let (cmd, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match cmd {
        "new" | "reset" => Command::New,
        "retry" => Command::Retry,
        "name" => Command::Name(arg.trim()),
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other),
    }
}

pub struct Repl {
    controller: Arc<SessionController>,
    identity: Arc<dyn IdentitySource>,
    records: Option<Arc<dyn RecordStore>>,
    pending: PendingWrites,
    flush_timeout: Duration,
}

impl Repl {
    pub fn new(
        controller: Arc<SessionController>,
        identity: Arc<dyn IdentitySource>,
        records: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        Self {
            controller,
            identity,
            records,
            pending: PendingWrites::default(),
            flush_timeout: FLUSH_TIMEOUT,
        }
    }

    fn display_name(&self) -> Option<String> {
        self.controller.store().display_name()
    }

    fn print_transcript(&self) {
        let name = self.display_name();
        for msg in self.controller.transcript() {
            println!("{}", render::message_line(&msg, name.as_deref()));
        }
        if let Some(error) = self.controller.error() {
            println!("{}", render::error_line(&error));
        }
    }

    /// Read and dispatch lines until `/quit` or end of input, then wait for
    /// any record writes the conversation started.
    pub async fn run<R>(&self, lines: &mut Lines<R>) -> s2h_common::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        println!("{}", render::greeting(self.display_name().as_deref()));
        if self.controller.transcript().len() > 1 {
            if let Some(saved_at) = self.controller.store().saved_at() {
                println!("{}", render::resumed_line(saved_at));
            }
        }
        self.print_transcript();

        let result = self.dispatch_lines(lines).await;
        self.pending.flush(self.flush_timeout).await;
        result
    }

    async fn dispatch_lines<R>(&self, lines: &mut Lines<R>) -> s2h_common::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        while let Some(line) = lines.next_line().await? {
            match parse_command(&line) {
                Command::Say(text) => {
                    let outcome = self.controller.send(text).await;
                    self.show_outcome(outcome);
                }
                Command::Retry => {
                    let outcome = self.controller.retry().await;
                    self.show_outcome(outcome);
                }
                Command::New => {
                    self.controller.reset();
                    self.print_transcript();
                }
                Command::Name(name) => {
                    if name.is_empty() {
                        println!("  usage: /name <your name>");
                    } else if let Err(e) = self.controller.store().set_display_name(name) {
                        debug!(error = %e, "display name not saved");
                        println!("  Could not save your name.");
                    } else {
                        println!("  I'll call you {name}.");
                    }
                }
                Command::History => self.show_history().await,
                Command::Help => println!("{}", render::HELP),
                Command::Quit => break,
                Command::Unknown(cmd) => println!("  unknown command /{cmd}, try /help"),
            }
        }
        Ok(())
    }

    fn show_outcome(&self, outcome: TurnOutcome) {
        match outcome {
            TurnOutcome::Replied { write_through, .. } => {
                if let Some(handle) = write_through {
                    self.pending.track(handle);
                }
                if let Some(last) = self.controller.transcript().last() {
                    let name = self.display_name();
                    println!("{}", render::message_line(last, name.as_deref()));
                }
            }
            TurnOutcome::Failed(error) => println!("{}", render::error_line(&error)),
            TurnOutcome::NothingToRetry => println!("  Nothing to retry."),
            TurnOutcome::Rejected | TurnOutcome::Stale => {}
        }
    }

    async fn show_history(&self) {
        let identity = self.identity.current();
        match fetch_history_from(self.records.as_deref(), identity.as_ref()).await {
            Ok(records) if records.is_empty() => {
                println!("  No records yet. Complete an assessment to save your first result.");
            }
            Ok(records) => {
                println!("Your Health History");
                for record in &records {
                    println!("{}", render::record_block(record));
                }
            }
            Err(e) => {
                warn!(error = %e, "history fetch failed");
                println!("  {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use s2h_chat::{
        ChatBackend, ChatError, ChatReply, HealthData, HealthRecord, Identity, InsertedRecord,
        MemoryStore, SessionStore, StaticIdentity, WriteThroughError,
    };
    use s2h_common::SessionId;

    /// Completes the assessment on every turn.
    struct AssessingBackend;

    #[async_trait]
    impl ChatBackend for AssessingBackend {
        async fn send(&self, _: &str, _: Option<&SessionId>) -> Result<ChatReply, ChatError> {
            Ok(ChatReply {
                reply: "Stress Level: HIGH".into(),
                session_id: None,
                health_data: Some(HealthData {
                    stress_level: "high".into(),
                    sleep_hours: 5.0,
                    bmi: 27.5,
                    activity_level: "low".into(),
                    health_risks: "Elevated risk".into(),
                }),
            })
        }
    }

    /// Inserts take long enough to outlive the last line of input.
    #[derive(Default)]
    struct SlowRecords {
        inserted: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for SlowRecords {
        async fn insert(
            &self,
            _: &HealthData,
            _: Option<&Identity>,
        ) -> Result<InsertedRecord, WriteThroughError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.inserted.fetch_add(1, Ordering::SeqCst);
            Ok(InsertedRecord {
                id: "1".into(),
                created_at: "now".into(),
            })
        }

        async fn fetch_history(
            &self,
            _: Option<&Identity>,
        ) -> Result<Vec<HealthRecord>, WriteThroughError> {
            Ok(Vec::new())
        }
    }

    fn signed_in_repl(records: Arc<SlowRecords>) -> Repl {
        let identity: Arc<dyn IdentitySource> =
            Arc::new(StaticIdentity::signed_in(Identity::new("u1")));
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let controller = SessionController::new(store, Arc::new(AssessingBackend), identity.clone())
            .with_records(records.clone());
        let records: Arc<dyn RecordStore> = records;
        Repl::new(Arc::new(controller), identity, Some(records))
    }

    #[tokio::test]
    async fn quit_waits_for_assessment_write() {
        let records = Arc::new(SlowRecords::default());
        let repl = signed_in_repl(records.clone());
        let mut lines = BufReader::new(&b"high\n/quit\n"[..]).lines();

        repl.run(&mut lines).await.unwrap();
        assert_eq!(records.inserted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn end_of_input_waits_for_assessment_write() {
        let records = Arc::new(SlowRecords::default());
        let repl = signed_in_repl(records.clone());
        let mut lines = BufReader::new(&b"high\n"[..]).lines();

        repl.run(&mut lines).await.unwrap();
        assert_eq!(records.inserted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn plain_text_is_said_verbatim() {
        assert_eq!(parse_command("  hello there "), Command::Say("  hello there "));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_command("/new"), Command::New);
        assert_eq!(parse_command("/retry"), Command::Retry);
        assert_eq!(parse_command("/name  Ada Lovelace "), Command::Name("Ada Lovelace"));
        assert_eq!(parse_command("/name"), Command::Name(""));
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/bogus"), Command::Unknown("bogus"));
    }
}
