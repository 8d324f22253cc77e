// ../tests/tests.rs
use coach_gpt::ai_response::GenerateContentRequest;
use coach_gpt::app::{Action, App};
use coach_gpt::fallback::{self, GENERAL_DEFAULT_REPLY, JOKES, KNOWLEDGE_PREFIX};
use coach_gpt::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

// Generator that replays scripted results and records every prompt it sees.
#[derive(Clone, Default)]
struct ScriptedGenerator {
    results: Arc<Mutex<VecDeque<Result<String, CallError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    fn new(results: Vec<Result<String, CallError>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results.into())),
            prompts: Arc::default(),
        }
    }

    fn always_failing() -> Self {
        Self::default()
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log").clone()
    }
}

impl Generator for ScriptedGenerator {
    async fn generate_content(&self, request: &GenerateContentRequest) -> Result<String, CallError> {
        let prompt = request.contents[0].parts[0].text.clone().unwrap_or_default();
        self.prompts.lock().expect("prompt log").push(prompt);
        self.results
            .lock()
            .expect("scripted results")
            .pop_front()
            .unwrap_or(Err(CallError::Transport("connection refused".to_string())))
    }
}

fn gaming_context() -> SessionContext {
    SessionContext::new("valorant", "Diamond III", 73.0, 1.42, ConversationMode::Gaming)
}

fn coach_with(generator: ScriptedGenerator, knowledge: KnowledgeBase) -> Coach<ScriptedGenerator> {
    let settings = Settings {
        typing_delay_ms: 0,
        ..Settings::default()
    };
    Coach::from_settings(&settings, generator, Arc::new(knowledge))
        .with_rng(StdRng::seed_from_u64(7))
}

fn aim_knowledge() -> KnowledgeBase {
    KnowledgeBase::new(vec![KnowledgeEntry::new("how to aim better", "practice daily")])
}

fn coach_messages(transcript: &Transcript) -> Vec<&Message> {
    transcript
        .messages()
        .iter()
        .filter(|message| message.role == Role::Coach)
        .collect()
}

#[test]
fn test_loader_keeps_commas_inside_answers() {
    let knowledge = KnowledgeBase::load("tests/knowledge_fixture.csv");

    assert!(knowledge.is_loaded());
    assert_eq!(knowledge.len(), 4);
    assert_eq!(
        knowledge.entries()[0],
        KnowledgeEntry::new(
            "how to aim better",
            "practice daily, warm up for 10 minutes, and keep your crosshair at head level"
        )
    );
    assert_eq!(knowledge.entries()[1].answer, "Sage, Brimstone, or Reyna");
    assert_eq!(knowledge.entries()[2].answer, "save together, buy together");
}

#[test]
fn test_missing_knowledge_file_always_misses() {
    let knowledge = KnowledgeBase::load("tests/does_not_exist.csv");

    assert!(!knowledge.is_loaded());
    assert!(knowledge.is_empty());
    assert_eq!(find_match("how to aim better", knowledge.entries()), None);
}

#[test]
fn test_duplicate_questions_first_one_wins() {
    let knowledge = KnowledgeBase::load("tests/knowledge_fixture.csv");
    let entry = find_match("How To Aim Better", knowledge.entries()).expect("exact match");
    assert!(entry.answer.starts_with("practice daily"));
}

#[test]
fn test_exact_match_beats_earlier_partial_match() {
    let entries = vec![
        KnowledgeEntry::new("best agent for beginners on ascent", "partial"),
        KnowledgeEntry::new("best agent for beginners", "exact"),
    ];

    let entry = find_match("Best agent for BEGINNERS", &entries).expect("match");
    assert_eq!(entry.answer, "exact");
}

#[test]
fn test_partial_match_needs_two_meaningful_tokens() {
    let entries = vec![KnowledgeEntry::new("how to improve spray control", "pull down")];

    // Only "spray" is shared; "to" and "my" are noise.
    assert_eq!(find_match("fix my spray to win", &entries), None);
    assert_eq!(
        find_match("my spray control is bad", &entries).map(|e| e.answer.as_str()),
        Some("pull down")
    );
}

#[test]
fn test_short_utterances_only_match_exactly() {
    let entries = vec![KnowledgeEntry::new("aim tips", "crosshair at head level")];

    assert!(find_match("aim", &entries).is_none());
    assert!(find_match("AIM TIPS", &entries).is_some());
}

#[test]
fn test_partial_threshold_is_configurable() {
    let entries = vec![KnowledgeEntry::new("how to rotate faster", "watch the minimap")];
    let strict = KnowledgeMatcher::new(3);
    let loose = KnowledgeMatcher::new(1);

    assert!(strict.find_match("rotate faster please", &entries).is_none());
    assert!(loose.find_match("rotate please", &entries).is_some());
}

#[test]
fn test_aim_question_hits_knowledge_base() {
    let knowledge = aim_knowledge();
    let utterance = "How do I aim better in this game";

    let entry = find_match(utterance, knowledge.entries()).expect("aim + better overlap");
    assert_eq!(entry.question, "how to aim better");

    let reply = FallbackResponder::default().respond(
        utterance,
        &gaming_context(),
        knowledge.entries(),
        &mut StdRng::seed_from_u64(1),
    );
    assert_eq!(reply, "Based on my gaming knowledge: practice daily");
}

#[test]
fn test_fallback_rule_precedence() {
    let responder = FallbackResponder::default();
    let context = gaming_context();
    let knowledge = aim_knowledge();
    let mut rng = StdRng::seed_from_u64(3);

    let greeting = responder.respond("hey, how to aim better", &context, knowledge.entries(), &mut rng);
    assert!(fallback::greetings(&context).contains(&greeting));

    let wellbeing = responder.respond("How are you today?", &context, &[], &mut rng);
    assert!(wellbeing.starts_with("I'm doing great!"));

    let morning = responder.respond("good morning coach", &context, &[], &mut rng);
    assert!(fallback::time_greetings(&context).contains(&morning));

    let thanks = responder.respond("thanks a lot", &context, &[], &mut rng);
    assert!(thanks.starts_with("You're very welcome!"));

    let identity = responder.respond("what are you exactly", &context, &[], &mut rng);
    assert!(identity.contains("current rank of Diamond III"));
}

#[test]
fn test_gaming_keyword_replies_use_live_context() {
    let responder = FallbackResponder::default();
    let context = SessionContext::new("cs2", "Global Elite", 68.0, 1.38, ConversationMode::Gaming);
    let mut rng = StdRng::seed_from_u64(5);

    let aim = responder.respond("my crosshair is everywhere", &context, &[], &mut rng);
    assert!(aim.starts_with("For cs2,") && aim.contains("Global Elite"));

    let rank = responder.respond("I want to rank up", &context, &[], &mut rng);
    assert!(rank.contains("68% win rate in cs2"));

    let money = responder.respond("when should I save money", &context, &[], &mut rng);
    assert!(money.starts_with("Economy management is crucial in cs2."));

    let other = responder.respond("smokes?", &context, &[], &mut rng);
    assert!(other.starts_with("I'd love to help you improve at cs2!"));
}

#[test]
fn test_general_mode_replies() {
    let responder = FallbackResponder::default();
    let context = gaming_context().with_mode(ConversationMode::General);
    let mut rng = StdRng::seed_from_u64(11);

    let mut jokes = HashSet::new();
    for _ in 0..64 {
        jokes.insert(responder.respond("tell me a joke", &context, &[], &mut rng));
    }
    let expected: HashSet<String> = JOKES.iter().map(|joke| joke.to_string()).collect();
    assert_eq!(jokes, expected);

    let aim = responder.respond("my aim is off", &context, &[], &mut rng);
    assert_eq!(aim, GENERAL_DEFAULT_REPLY);

    let help = responder.respond("can you help me", &context, &[], &mut rng);
    assert!(help.starts_with("I'm here to help!"));
}

#[test]
fn test_greetings_cover_every_template() {
    let responder = FallbackResponder::default();
    let context = gaming_context();
    let mut rng = StdRng::seed_from_u64(42);

    let seen: HashSet<String> = (0..64)
        .map(|_| responder.respond("hello", &context, &[], &mut rng))
        .collect();
    let expected: HashSet<String> = fallback::greetings(&context).into_iter().collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_same_seed_same_replies() {
    let responder = FallbackResponder::default();
    let context = gaming_context();
    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..8)
            .map(|_| responder.respond("hi", &context, &[], &mut rng))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(9), run(9));
}

#[tokio::test]
async fn test_every_message_gets_exactly_one_coach_reply() {
    let coach = coach_with(ScriptedGenerator::always_failing(), KnowledgeBase::empty());
    let utterances = ["asdf qwer zxcv", "?!", "a", "🎮🎮🎮", "how to aim better"];

    for mode in [ConversationMode::Gaming, ConversationMode::General] {
        let context = gaming_context().with_mode(mode);
        let mut transcript = Transcript::new(&context.selected_game);
        for utterance in utterances {
            let before = transcript.len();
            let (next, status) = coach.handle_turn(utterance, &context, transcript).await;
            transcript = next;

            assert_eq!(transcript.len(), before + 2);
            let reply = transcript.last().expect("coach reply");
            assert_eq!(reply.role, Role::Coach);
            assert_eq!(reply.category, mode);
            assert!(!reply.text.trim().is_empty());
            assert_eq!(status, ConnectivityStatus::Error);
        }
    }
}

#[tokio::test]
async fn test_transcript_alternates_user_and_coach() {
    let coach = coach_with(ScriptedGenerator::always_failing(), aim_knowledge());
    let context = gaming_context();
    let mut transcript = Transcript::new("valorant");

    for utterance in ["hello", "how do I aim better", "thanks"] {
        transcript = coach.handle_turn(utterance, &context, transcript).await.0;
    }

    let roles: Vec<Role> = transcript.messages()[1..].iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Coach, Role::User, Role::Coach, Role::User, Role::Coach]
    );
    assert_eq!(transcript.messages()[4].text, format!("{KNOWLEDGE_PREFIX}practice daily"));
}

#[tokio::test]
async fn test_blank_input_is_a_no_op() {
    let generator = ScriptedGenerator::new(vec![Ok("remote".to_string())]);
    let coach = coach_with(generator.clone(), KnowledgeBase::empty());
    let context = gaming_context();
    let transcript = Transcript::new("valorant");

    for blank in ["", "   ", "\n\t"] {
        let (after, status) = coach.handle_turn(blank, &context, transcript.clone()).await;
        assert_eq!(after, transcript);
        assert_eq!(status, ConnectivityStatus::Unknown);
    }
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_clear_leaves_single_seed_and_status() {
    let generator = ScriptedGenerator::new(vec![
        Ok("first".to_string()),
        Err(CallError::Upstream {
            status: 503,
            body: "overloaded".to_string(),
        }),
    ]);
    let coach = coach_with(generator, KnowledgeBase::empty());
    let context = gaming_context();
    let mut transcript = Transcript::new("valorant");

    transcript = coach.handle_turn("tip one", &context, transcript).await.0;
    transcript = coach.handle_turn("tip two", &context, transcript).await.0;
    assert_eq!(coach.status(), ConnectivityStatus::Error);

    coach.clear(&mut transcript, &context);

    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript.messages()[0].role, Role::Coach);
    assert_eq!(coach.status(), ConnectivityStatus::Error);
}

#[tokio::test]
async fn test_status_follows_last_call() {
    let generator = ScriptedGenerator::new(vec![
        Ok("Hold the angle.".to_string()),
        Err(CallError::Upstream {
            status: 500,
            body: "boom".to_string(),
        }),
        Ok("Trade your entry.".to_string()),
    ]);
    let coach = coach_with(generator, KnowledgeBase::empty());
    let context = gaming_context();
    let mut transcript = Transcript::new("valorant");

    let (next, status) = coach.handle_turn("first", &context, transcript).await;
    assert_eq!(status, ConnectivityStatus::Connected);
    assert_eq!(next.last().map(|m| m.text.as_str()), Some("Hold the angle."));
    transcript = next;

    let (next, status) = coach.handle_turn("second", &context, transcript).await;
    assert_eq!(status, ConnectivityStatus::Error);
    transcript = next;

    let (next, status) = coach.handle_turn("third", &context, transcript).await;
    assert_eq!(status, ConnectivityStatus::Connected);
    assert_eq!(next.last().map(|m| m.text.as_str()), Some("Trade your entry."));
}

#[tokio::test]
async fn test_remote_prompt_is_grounded_with_knowledge() {
    let generator = ScriptedGenerator::new(vec![Ok("Aim lower.".to_string())]);
    let coach = coach_with(generator.clone(), aim_knowledge());
    let context = gaming_context();

    let (transcript, _) = coach
        .handle_turn("How do I aim better in this game", &context, Transcript::new("valorant"))
        .await;

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"how to aim better\" - practice daily"));
    assert!(prompts[0].ends_with("User: How do I aim better in this game"));
    assert_eq!(transcript.last().map(|m| m.text.as_str()), Some("Aim lower."));
}

#[tokio::test]
async fn test_reply_for_cleared_conversation_is_discarded() {
    let coach = coach_with(ScriptedGenerator::always_failing(), KnowledgeBase::empty());
    let context = gaming_context();
    let mut transcript = Transcript::new("valorant");

    let turn = coach
        .begin_turn(&mut transcript, "tips for retakes", &context)
        .expect("turn opened");
    assert_eq!(coach.turn_state(), TurnState::AwaitingReply);

    coach.clear(&mut transcript, &context);
    let reply = coach.resolve(&turn, &context).await;
    assert_eq!(reply.source, ReplySource::Fallback);

    assert_eq!(coach.complete_turn(&mut transcript, turn, reply), TurnOutcome::Stale);
    assert_eq!(transcript.len(), 1);
    assert_eq!(coach.turn_state(), TurnState::Idle);
}

#[tokio::test]
async fn test_interleaved_turns_each_get_one_reply() {
    let generator = ScriptedGenerator::new(vec![Ok("one".to_string()), Ok("two".to_string())]);
    let coach = coach_with(generator, KnowledgeBase::empty());
    let context = gaming_context();
    let mut transcript = Transcript::new("valorant");

    let first = coach.begin_turn(&mut transcript, "first", &context).expect("first");
    let second = coach.begin_turn(&mut transcript, "second", &context).expect("second");
    assert_eq!(coach.typing().pending(), 2);

    let second_reply = coach.resolve(&second, &context).await;
    let first_reply = coach.resolve(&first, &context).await;
    coach.complete_turn(&mut transcript, second, second_reply);
    coach.complete_turn(&mut transcript, first, first_reply);

    assert_eq!(coach_messages(&transcript).len(), 3);
    assert_eq!(transcript.len(), 5);
    assert!(!coach.typing().is_typing());
}

#[tokio::test]
async fn test_app_sends_and_receives_reply() {
    let settings = Settings {
        typing_delay_ms: 0,
        default_game: "cs2".to_string(),
        ..Settings::default()
    };
    let generator = ScriptedGenerator::new(vec![Ok("Crouch less.".to_string())]);
    let coach = Coach::from_settings(&settings, generator, Arc::new(KnowledgeBase::empty()));
    let mut app = App::new(coach, &settings);

    assert_eq!(app.context().rank, "Global Elite");

    let output = app.dispatch(Action::Send("my spray is bad".to_string())).await;
    assert!(output.is_empty());
    let first = app.tick_typing().expect("reply pending");
    let second = app.tick_typing().expect("reply pending");
    assert_eq!(first, "CoachGPT is typing ⠙");
    assert_eq!(second, "CoachGPT is typing ⠹");

    let reply = app.next_reply().await.expect("rendered reply");
    assert_eq!(app.tick_typing(), None);
    assert!(reply.ends_with("CoachGPT: Crouch less."));
    assert_eq!(app.transcript().len(), 3);

    app.dispatch(Action::SetGame("dota2".to_string())).await;
    assert_eq!(app.context().rank, "Ancient III");

    let tips = app.dispatch(Action::ShowTips).await;
    assert_eq!(tips[0], "  1. Hero itemization");

    app.dispatch(Action::Clear).await;
    assert_eq!(app.transcript().len(), 1);

    app.dispatch(Action::Quit).await;
    assert!(!app.is_running());
}

#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("settings.json");
    let settings = Settings {
        api_key: Some("test-key".to_string()),
        partial_match_threshold: 3,
        default_game: "apex".to_string(),
        ..Settings::default()
    };

    settings.save_to_file(&path).expect("settings saved");
    let loaded = Settings::load_settings_from_file(&path).expect("settings loaded");

    assert_eq!(loaded, settings);
    assert!(loaded.has_api_key());
}

#[test]
fn test_unreadable_settings_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").expect("write garbage");

    assert!(matches!(
        Settings::load_settings_from_file(&path),
        Err(AppError::Serialization(_))
    ));
    assert!(matches!(
        Settings::load_settings_from_file(dir.path().join("missing.json")),
        Err(AppError::Io(_))
    ));
}

#[tokio::test]
async fn test_connection_check_updates_status() {
    let generator = ScriptedGenerator::new(vec![
        Ok("pong".to_string()),
        Err(CallError::Unauthenticated),
    ]);
    let coach = coach_with(generator.clone(), KnowledgeBase::empty());

    assert!(coach.test_connection().await);
    assert_eq!(coach.status(), ConnectivityStatus::Connected);
    assert!(!coach.test_connection().await);
    assert_eq!(coach.status(), ConnectivityStatus::Error);
    assert_eq!(generator.prompts(), vec!["Hello, this is a test message.".to_string(); 2]);
}
