// /app.rs
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::ai::Generator;
use crate::coach::{Coach, PendingTurn, Reply, TurnOutcome};
use crate::context::{ConversationMode, SessionContext};
use crate::error::Result;
use crate::game_stats::{GENERAL_TOPICS, GameProfile, game_ids};
use crate::message::{Message, Role, Transcript};
use crate::settings::Settings;

const CLEAR_ROW: &str = "\r\x1b[2K";
const SPINNER_INTERVAL: Duration = Duration::from_millis(120);

const HELP: &str = "Commands:
  /clear                 start a new conversation
  /mode gaming|general   switch conversation mode
  /game <id>             switch game
  /tips                  list suggested questions
  /tip <n>               ask suggested question n
  /status                show connection and knowledge base status
  /test                  test the Gemini connection
  /help                  show this help
  /quit                  exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Send(String),
    Clear,
    SetMode(ConversationMode),
    SetGame(String),
    ShowTips,
    SendTip(usize),
    ShowStatus,
    TestConnection,
    Help,
    Quit,
    Invalid(String),
}

impl Action {
    pub fn parse(line: &str) -> Option<Action> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(Action::Send(line.to_string()));
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (command, ""),
        };

        let action = match name.to_lowercase().as_str() {
            "clear" => Action::Clear,
            "mode" => match ConversationMode::from_str(argument) {
                Ok(mode) => Action::SetMode(mode),
                Err(_) => Action::Invalid(format!("Unknown mode '{argument}'. Use gaming or general.")),
            },
            "game" if !argument.is_empty() => Action::SetGame(argument.to_lowercase()),
            "game" => Action::Invalid("Usage: /game <id>".to_string()),
            "tips" => Action::ShowTips,
            "tip" => match argument.parse::<usize>() {
                Ok(index) if index > 0 => Action::SendTip(index),
                _ => Action::Invalid("Usage: /tip <n>".to_string()),
            },
            "status" => Action::ShowStatus,
            "test" => Action::TestConnection,
            "help" => Action::Help,
            "quit" | "exit" => Action::Quit,
            _ => Action::Invalid(format!("Unknown command '/{name}'. Type /help.")),
        };
        Some(action)
    }
}

pub struct App<G> {
    running: bool,
    coach: Arc<Coach<G>>,
    context: SessionContext,
    transcript: Transcript,
    reply_sender: mpsc::UnboundedSender<(PendingTurn, Reply)>,
    reply_receiver: mpsc::UnboundedReceiver<(PendingTurn, Reply)>,
}

impl<G: Generator + 'static> App<G> {
    pub fn new(coach: Coach<G>, settings: &Settings) -> Self {
        let context = SessionContext::for_game(&settings.default_game, ConversationMode::Gaming);
        let transcript = Transcript::new(&context.selected_game);
        let (reply_sender, reply_receiver) = mpsc::unbounded_channel();

        Self {
            running: true,
            coach: Arc::new(coach),
            context,
            transcript,
            reply_sender,
            reply_receiver,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        if let Some(seed) = self.transcript.last() {
            write_line(&mut stdout, &render(seed)).await?;
        }
        write_line(&mut stdout, "Type /help for commands.").await?;

        let mut spinner = interval(SPINNER_INTERVAL);
        spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    let Some(action) = Action::parse(&line) else {
                        continue;
                    };
                    for output in self.dispatch(action).await {
                        write_line(&mut stdout, &output).await?;
                    }
                }
                Some((turn, reply)) = self.reply_receiver.recv() => {
                    if let Some(output) = self.on_reply(turn, reply) {
                        write_line(&mut stdout, &output).await?;
                    }
                }
                _ = spinner.tick(), if self.coach.typing().is_typing() => {
                    if let Some(label) = self.tick_typing() {
                        write_status(&mut stdout, &label).await?;
                    }
                }
            }
        }

        log::info!("CoachGPT exit: {}", chrono::Local::now());
        Ok(())
    }

    /// Applies one action and returns the lines to show. Messages are
    /// resolved on a spawned task and come back through `next_reply`.
    pub async fn dispatch(&mut self, action: Action) -> Vec<String> {
        match action {
            Action::Send(text) => {
                self.send(&text);
                Vec::new()
            }
            Action::SendTip(index) => match index
                .checked_sub(1)
                .and_then(|position| self.suggestions().get(position))
            {
                Some(tip) => {
                    let tip = tip.to_string();
                    self.send(&tip);
                    vec![format!("You: {tip}")]
                }
                None => vec![format!("No tip number {index}. Type /tips.")],
            },
            Action::Clear => {
                self.coach.clear(&mut self.transcript, &self.context);
                self.transcript.last().map(render).into_iter().collect()
            }
            Action::SetMode(mode) => {
                self.context = self.context.clone().with_mode(mode);
                vec![format!("Conversation mode: {mode}")]
            }
            Action::SetGame(game_id) => match GameProfile::find(&game_id) {
                Some(profile) => {
                    self.context =
                        SessionContext::for_game(profile.id, self.context.conversation_mode);
                    vec![format!(
                        "Now coaching {} ({}, {}% win rate, {} KDA)",
                        profile.name, profile.rank, profile.win_rate, profile.kda
                    )]
                }
                None => vec![format!(
                    "Unknown game '{game_id}'. Available: {}",
                    game_ids().collect::<Vec<_>>().join(", ")
                )],
            },
            Action::ShowTips => self
                .suggestions()
                .iter()
                .enumerate()
                .map(|(index, tip)| format!("  {}. {tip}", index + 1))
                .collect(),
            Action::ShowStatus => self.status_lines(),
            Action::TestConnection => {
                let connected = self.coach.test_connection().await;
                vec![format!(
                    "Connection test {} (status: {})",
                    if connected { "passed" } else { "failed" },
                    self.coach.status()
                )]
            }
            Action::Help => vec![HELP.to_string()],
            Action::Quit => {
                self.running = false;
                Vec::new()
            }
            Action::Invalid(message) => vec![message],
        }
    }

    pub async fn next_reply(&mut self) -> Option<String> {
        let (turn, reply) = self.reply_receiver.recv().await?;
        self.on_reply(turn, reply)
    }

    /// Advances the typing spinner and returns its line, or `None` when no
    /// reply is pending.
    pub fn tick_typing(&self) -> Option<String> {
        let typing = self.coach.typing();
        if !typing.is_typing() {
            return None;
        }
        typing.next_frame();
        Some(typing.label())
    }

    fn send(&mut self, text: &str) {
        let Some(turn) = self
            .coach
            .begin_turn(&mut self.transcript, text, &self.context)
        else {
            return;
        };

        let coach = Arc::clone(&self.coach);
        let context = self.context.clone();
        let reply_sender = self.reply_sender.clone();
        tokio::spawn(async move {
            let reply = coach.resolve(&turn, &context).await;
            if reply_sender.send((turn, reply)).is_err() {
                log::warn!("Reply dropped, the app is shutting down");
            }
        });
    }

    fn on_reply(&mut self, turn: PendingTurn, reply: Reply) -> Option<String> {
        log::debug!("Reply for message {} from {:?}", turn.user_message_id(), reply.source);
        match self.coach.complete_turn(&mut self.transcript, turn, reply) {
            TurnOutcome::Resolved { .. } => self.transcript.last().map(render),
            TurnOutcome::Stale => None,
        }
    }

    fn suggestions(&self) -> &'static [&'static str] {
        match self.context.conversation_mode {
            ConversationMode::Gaming => GameProfile::find_or_default(&self.context.selected_game).tips,
            ConversationMode::General => GENERAL_TOPICS,
        }
    }

    fn status_lines(&self) -> Vec<String> {
        let knowledge = self.coach.knowledge();
        let knowledge_line = if knowledge.is_loaded() {
            format!("Knowledge base: {} entries", knowledge.len())
        } else {
            "Knowledge base: not loaded".to_string()
        };
        vec![
            format!("Gemini: {}", self.coach.status()),
            knowledge_line,
            format!(
                "Game: {} ({}), mode: {}",
                self.context.selected_game, self.context.rank, self.context.conversation_mode
            ),
            format!("Pending replies: {}", self.coach.typing().pending()),
        ]
    }
}

fn render(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Coach => "CoachGPT",
        Role::System => "System",
    };
    format!(
        "[{}] {speaker}: {}",
        message.timestamp.format("%H:%M"),
        message.text
    )
}

// Lines start by wiping whatever spinner text is on the current row.
async fn write_line(stdout: &mut tokio::io::Stdout, line: &str) -> Result<()> {
    stdout.write_all(CLEAR_ROW.as_bytes()).await?;
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

async fn write_status(stdout: &mut tokio::io::Stdout, status: &str) -> Result<()> {
    stdout.write_all(CLEAR_ROW.as_bytes()).await?;
    stdout.write_all(status.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
