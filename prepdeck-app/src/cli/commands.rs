use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::config::{Settings, StoreKind};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use prepdeck_core::admin::{ai_settings, save_ai_settings, user_stats, Moderation};
use prepdeck_core::ai::TextGenerator;
use prepdeck_core::gallery::Gallery;
use prepdeck_core::notes::Notebook;
use prepdeck_core::planner::Planner;
use prepdeck_core::practice::{
    format_clock, session_history, AnswerPractice, Countdown, InterviewLab, QUESTION_SECONDS,
};
use prepdeck_core::records::{
    AiSettings, AnswerSession, InterviewQuestion, InterviewSession, Note, PanelType, PracticeQuestion, Priority,
    Profile, StudyGoal, StudyPlan, VisualizationMode,
};
use prepdeck_core::{
    daily_streak, favorite_notes, repo, summarize, DeckBoard, Flashcards, LoadOutcome, MemoryStore, RecordStore,
    ReviewSession, Scope, SessionOrder, SessionStep,
};
use prepdeck_json::JsonStore;
use prepdeck_remote::{HttpGenerator, RestStore};
use prepdeck_sqlite::SqliteStore;
use std::io::{stdin, stdout, Read, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub async fn run_cli(args: Cli, settings: Settings) -> Result<()> {
    let store = open_store(&settings).await?;
    info!(store = ?settings.store, "store ready");

    // collections loaded by this command stop applying results once it returns
    let scope = Scope::new();
    let _guard = scope.guard();

    match args.cmd {
        Command::Deck(cmd) => deck_cmd(store, scope.child(), cmd).await,
        Command::Card(cmd) => card_cmd(store, scope.child(), cmd).await,
        Command::Review(cmd) => review_cmd(Flashcards::new(store), cmd).await,
        Command::Due(cmd) => due_cmd(Flashcards::new(store), cmd).await,
        Command::Stats => stats_cmd(Flashcards::new(store)).await,
        Command::Note(cmd) => note_cmd(Notebook::new(store, scope.child()), cmd).await,
        Command::Plan(cmd) => plan_cmd(Planner::new(store, scope.child()), cmd).await,
        Command::Goal(cmd) => goal_cmd(Planner::new(store, scope.child()), cmd).await,
        Command::Answer(cmd) => {
            let ai = open_generator(&settings)?;
            answer_cmd(AnswerPractice::new(store, ai), cmd).await
        }
        Command::Interview(cmd) => {
            let ai = open_generator(&settings)?;
            interview_cmd(InterviewLab::new(store, ai), cmd).await
        }
        Command::History => history_cmd(store, &scope).await,
        Command::Viz(cmd) => viz_cmd(Gallery::new(store, scope.child()), cmd).await,
        Command::Admin(cmd) => admin_cmd(store, scope.child(), cmd).await,
        Command::Api(api) => {
            let addr: std::net::SocketAddr = api.addr.parse()?;
            api_server::run(store, addr).await
        }
    }
}

pub async fn open_store(settings: &Settings) -> Result<Arc<dyn RecordStore>> {
    match settings.store {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Json => {
            let s = JsonStore::open_default().await?;
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = &settings.db_path;
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let s = SqliteStore::open_file(p).await?;
            Ok(Arc::new(s))
        }
        StoreKind::Remote => {
            let url = settings
                .remote_url
                .as_deref()
                .context("--store remote needs --remote-url (or remote.url in prepdeck.toml)")?;
            let key = settings.remote_key.clone().unwrap_or_default();
            Ok(Arc::new(RestStore::new(url, key)?))
        }
    }
}

fn open_generator(settings: &Settings) -> Result<Arc<dyn TextGenerator>> {
    let url = settings
        .ai_url
        .as_deref()
        .context("scoring needs --ai-url (or ai.url in prepdeck.toml)")?;
    Ok(Arc::new(HttpGenerator::new(url, settings.ai_key.clone())?))
}

fn report_load(what: &str, outcome: &LoadOutcome) {
    if let LoadOutcome::Fallback { error } = outcome {
        warn!(%error, "{what} unavailable, showing sample data");
        eprintln!("! could not load {what} ({error}); showing sample data");
    }
}

async fn load_board(store: Arc<dyn RecordStore>, scope: Scope) -> DeckBoard {
    let board = DeckBoard::new(store, scope);
    let (decks, cards) = board.load().await;
    report_load("decks", &decks);
    report_load("flashcards", &cards);
    board
}

async fn deck_cmd(store: Arc<dyn RecordStore>, scope: Scope, cmd: DeckCmd) -> Result<()> {
    let fc = Flashcards::new(store.clone());
    match cmd {
        DeckCmd::Add { name, subject } => {
            let d = fc.create_deck(&name, &subject).await?;
            println!("{}", d.id);
        }
        DeckCmd::List => {
            let board = load_board(store, scope).await;
            for d in board.decks() {
                println!("{}\t{}\t{}\tcards={}\tmastery={}%", d.id, d.name, d.subject, d.cards_count, d.mastery);
            }
        }
        DeckCmd::Rm { deck } => {
            let d = fc.resolve_deck(&deck).await?;
            fc.delete_deck(d.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn card_cmd(store: Arc<dyn RecordStore>, scope: Scope, cmd: CardCmd) -> Result<()> {
    let fc = Flashcards::new(store.clone());
    match cmd {
        CardCmd::Add(a) => {
            let deck = fc.resolve_deck(&a.deck).await?;
            let c = fc.add_card(deck.id, &a.front, &a.back, a.difficulty).await?;
            println!("{}", c.id);
        }
        CardCmd::List { deck } => {
            let board = load_board(store, scope).await;
            let deck_id = match deck {
                Some(sel) => Some(board.find_deck(&sel).ok_or_else(|| anyhow!("deck not found: {sel}"))?.id),
                None => None,
            };
            for c in board.cards_for(deck_id) {
                println!(
                    "{}\t{}\t{}\tdifficulty={}\tnext={}\tmastered={}",
                    c.id,
                    c.front,
                    c.back,
                    c.difficulty,
                    c.next_review_at.format("%Y-%m-%d"),
                    c.mastered
                );
            }
        }
        CardCmd::Rm { card_id } => {
            fc.delete_card(parse_uuid(&card_id)?).await?;
            println!("ok");
        }
        CardCmd::Edit(e) => {
            let card = fc.get_card(parse_uuid(&e.card_id)?).await?;
            let mut card = match e.difficulty {
                Some(d) => card.with_difficulty(d),
                None => card,
            };
            if let Some(f) = e.front {
                card.front = f;
            }
            if let Some(b) = e.back {
                card.back = b;
            }
            fc.update_card(&card).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn review_cmd(fc: Flashcards, cmd: ReviewCmd) -> Result<()> {
    let deck = fc.resolve_deck(&cmd.deck).await?;
    let order = match cmd.order {
        OrderArg::Collection => SessionOrder::Collection,
        OrderArg::MostOverdue => SessionOrder::MostOverdue,
    };
    let mut session = fc.start_session(deck.id, order).await?;
    let total = session.remaining();

    while let Some(card) = session.current().cloned() {
        println!("\n[{}/{}] {}", position(&session, total), total, deck.name);
        println!("Q: {}", card.front);
        prompt_enter("[enter=show]")?;
        println!("A: {}", card.back);
        println!("[1-5 = how well you knew it, s=skip, q=quit]");
        let step = loop {
            let line = read_line("rating> ")?;
            match line.trim().to_lowercase().as_str() {
                "s" | "skip" => break session.skip()?,
                "q" | "quit" => return Ok(()),
                other => match other.parse::<i64>() {
                    Ok(r @ 1..=5) => {
                        let rated = session.rate(r)?;
                        fc.persist_rating(&rated.outcome).await?;
                        let c = &rated.outcome.updated_card;
                        if c.mastered {
                            println!("-> mastered");
                        } else {
                            println!("-> next review in {} day(s)", rated.outcome.review.interval_days);
                        }
                        break rated.step;
                    }
                    _ => println!("enter 1-5, s, or q"),
                },
            }
        };
        if let SessionStep::Completed { reviewed } = step {
            println!("\nsession complete: reviewed {reviewed} of {total}");
        }
    }
    Ok(())
}

async fn due_cmd(fc: Flashcards, cmd: DueCmd) -> Result<()> {
    let deck_id = match cmd.deck {
        Some(sel) => Some(fc.resolve_deck(&sel).await?.id),
        None => None,
    };
    let due = fc.due_cards(deck_id, Utc::now()).await?;
    if due.is_empty() {
        println!("no cards due");
    }
    for c in due.into_iter().take(cmd.max) {
        println!("{}\t{}\tdue={}", c.id, c.front, c.next_review_at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

async fn stats_cmd(fc: Flashcards) -> Result<()> {
    let reviews = fc.reviews(None).await?;
    let s = summarize(&reviews);
    println!("reviews: {}", s.totals.total);
    println!("accuracy: {:.0}%", s.totals.accuracy() * 100.0);
    for (i, n) in s.totals.by_rating.iter().enumerate() {
        println!("  rating {}: {}", i + 1, n);
    }
    println!("streak: {} day(s)", daily_streak(&reviews, Local::now().date_naive()));
    Ok(())
}

async fn note_cmd(book: Notebook, cmd: NoteCmd) -> Result<()> {
    let outcome = book.load().await;
    report_load("notes", &outcome);
    match cmd {
        NoteCmd::Add {
            title,
            content,
            subject,
            tags,
        } => {
            let mut note = Note::new(title, content, subject);
            note.tags = tags;
            let n = book.save(note).await?;
            println!("{}", n.id);
        }
        NoteCmd::List {
            query,
            subject,
            favorites,
        } => {
            let mut notes = book.search(&query, &subject);
            if favorites {
                notes = favorite_notes(&notes);
            }
            for n in notes {
                let star = if n.is_favorite { "*" } else { " " };
                println!("{star} {}\t{}\t{}", n.id, n.subject, n.title);
            }
        }
        NoteCmd::Fav { id } => {
            let n = book.toggle_favorite(parse_uuid(&id)?).await?;
            println!("favorite={}", n.is_favorite);
        }
        NoteCmd::Rm { id } => {
            book.delete(parse_uuid(&id)?).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn plan_cmd(planner: Planner, cmd: PlanCmd) -> Result<()> {
    let (plans, _) = planner.load().await;
    report_load("study plans", &plans);
    match cmd {
        PlanCmd::Add {
            title,
            subject,
            minutes,
            date,
            priority,
        } => {
            let mut plan = StudyPlan::new(title, subject, minutes, parse_date_or_today(date.as_deref())?);
            plan.priority = match priority {
                PriorityArg::Low => Priority::Low,
                PriorityArg::Medium => Priority::Medium,
                PriorityArg::High => Priority::High,
            };
            let p = planner.add_plan(plan).await?;
            println!("{}", p.id);
        }
        PlanCmd::List { date } => {
            let day = parse_date_or_today(date.as_deref())?;
            for p in planner.plans_on(day) {
                let mark = if p.completed { "x" } else { " " };
                println!("[{mark}] {}\t{}\t{}\t{} min\t{:?}", p.id, p.title, p.subject, p.duration_minutes, p.priority);
            }
            let pr = planner.progress();
            println!(
                "done {}/{} plans, {}/{} min",
                pr.completed_plans, pr.total_plans, pr.completed_minutes, pr.total_minutes
            );
        }
        PlanCmd::Toggle { id } => {
            let p = planner.toggle_plan_completion(parse_uuid(&id)?).await?;
            println!("completed={}", p.completed);
        }
    }
    Ok(())
}

async fn goal_cmd(planner: Planner, cmd: GoalCmd) -> Result<()> {
    let (_, goals) = planner.load().await;
    report_load("goals", &goals);
    match cmd {
        GoalCmd::Add { title, target } => {
            let g = planner.add_goal(StudyGoal::new(title, parse_date(&target)?)).await?;
            println!("{}", g.id);
        }
        GoalCmd::List => {
            for g in planner.goals.records() {
                let mark = if g.achieved { "x" } else { " " };
                println!("[{mark}] {}\t{}\t{}%\tby {}", g.id, g.title, g.progress, g.target_date);
            }
        }
        GoalCmd::Progress { id, percent } => {
            let g = planner.update_goal_progress(parse_uuid(&id)?, percent).await?;
            println!("progress={}% achieved={}", g.progress, g.achieved);
        }
    }
    Ok(())
}

async fn answer_cmd(practice: AnswerPractice, cmd: AnswerCmd) -> Result<()> {
    let question = PracticeQuestion {
        id: Uuid::new_v4(),
        question: cmd.question,
        topic: cmd.topic,
        word_limit: cmd.word_limit,
        marks: cmd.marks,
        subject: cmd.subject,
    };
    println!("Q: {} ({} words, {} marks)", question.question, question.word_limit, question.marks);
    println!("time: {}; finish the answer with EOF (Ctrl-D)", format_clock(QUESTION_SECONDS));
    let session = AnswerSession::new(question.topic.clone(), vec![question], QUESTION_SECONDS / 60);

    let started = Instant::now();
    let mut text = String::new();
    stdin().read_to_string(&mut text)?;
    let mut clock = Countdown::new(QUESTION_SECONDS);
    if clock.advance(started.elapsed().as_secs()) {
        println!("time is up");
    }

    let out = practice.submit_answer(&session, &text, &clock).await?;
    let a = &out.answer;
    println!("\nwords: {}  time: {}", a.word_count, format_clock(a.time_taken_secs));
    println!("score {}/10 (structure {}, content {})", a.score, a.structure_score, a.content_score);
    println!("{}", a.feedback);
    Ok(())
}

async fn interview_cmd(lab: InterviewLab, cmd: InterviewCmd) -> Result<()> {
    let panel = match cmd.panel {
        PanelArg::Prelims => PanelType::Prelims,
        PanelArg::Mains => PanelType::Mains,
        PanelArg::Personality => PanelType::Personality,
    };
    let questions = cmd
        .questions
        .into_iter()
        .map(|q| InterviewQuestion {
            id: Uuid::new_v4(),
            question: q,
            category: "General".into(),
            expected_duration_secs: 120,
            follow_up: false,
        })
        .collect();
    let mut session = lab.start(&cmd.title, panel, questions).await?;

    while let Some(q) = session.current_question().cloned() {
        println!("\nQ{}: {}", session.current_question_index + 1, q.question);
        let text = read_line("> ")?;
        if text.trim().is_empty() {
            println!("(empty response, try again)");
            continue;
        }
        let out = lab.submit_response(&session, &text, &cmd.expertise).await?;
        let r = &out.response;
        println!(
            "confidence {} clarity {} content {} overall {}\n{}",
            r.confidence, r.clarity, r.content, r.overall_score, r.feedback
        );
        session = out.session;
        if out.completed {
            println!("\ninterview completed");
            break;
        }
    }
    Ok(())
}

async fn history_cmd(store: Arc<dyn RecordStore>, scope: &Scope) -> Result<()> {
    let (answers, outcome) = session_history::<AnswerSession>(&store, scope.child()).await;
    report_load("answer sessions", &outcome);
    println!("answer writing:");
    for s in answers {
        let best = s.answers.iter().map(|a| a.score).max().unwrap_or(0);
        println!(
            "  {}	{}	{}	answers={}	best={}/10",
            s.id,
            s.started_at.format("%Y-%m-%d"),
            s.title,
            s.answers.len(),
            best
        );
    }

    let (interviews, outcome) = session_history::<InterviewSession>(&store, scope.child()).await;
    report_load("interview sessions", &outcome);
    println!("interviews:");
    for s in interviews {
        println!(
            "  {}	{}	{}	{:?}	responses={}/{}",
            s.id,
            s.started_at.format("%Y-%m-%d"),
            s.title,
            s.status,
            s.responses.len(),
            s.questions.len()
        );
    }
    Ok(())
}

async fn viz_cmd(gallery: Gallery, cmd: VizCmd) -> Result<()> {
    report_load("visualizations", &gallery.load().await);
    match cmd {
        VizCmd::List { saved } => {
            let items = if saved { gallery.saved() } else { gallery.items.records() };
            for v in items {
                let mark = if v.saved { "*" } else { " " };
                println!("{mark} {}	{:?}	{}	nodes={}", v.id, v.mode, v.title, v.nodes.len());
            }
        }
        VizCmd::Add { title, mode } => {
            let mode = match mode {
                ModeArg::Syllabus => VisualizationMode::Syllabus,
                ModeArg::ConceptMap => VisualizationMode::ConceptMap,
                ModeArg::Geography3d => VisualizationMode::Geography3D,
            };
            let v = gallery.save(Gallery::start(&title, mode)?).await?;
            println!("{}", v.id);
        }
        VizCmd::Toggle { id } => {
            let v = gallery.toggle_saved(parse_uuid(&id)?).await?;
            println!("saved={}", v.saved);
        }
        VizCmd::Rm { id } => {
            gallery.delete(parse_uuid(&id)?).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn admin_cmd(store: Arc<dyn RecordStore>, scope: Scope, cmd: AdminCmd) -> Result<()> {
    let admin_sel = match &cmd {
        AdminCmd::Stats { admin }
        | AdminCmd::Pending { admin }
        | AdminCmd::Approve { admin, .. }
        | AdminCmd::Reject { admin, .. }
        | AdminCmd::ShowAi { admin }
        | AdminCmd::SetAi { admin, .. } => admin.clone(),
    };
    let admin: Profile = repo::fetch_by_id(&*store, parse_uuid(&admin_sel)?).await?;
    let moderation = Moderation::new(store.clone(), scope, &admin)?;

    match cmd {
        AdminCmd::Stats { .. } => {
            let s = user_stats(&*store, Utc::now()).await?;
            println!("total users:   {}", s.total_users);
            println!("active (7d):   {}", s.active_users);
            println!("premium:       {}", s.premium_users);
            println!("new today:     {}", s.new_users_today);
        }
        AdminCmd::Pending { .. } => {
            report_load("pending content", &moderation.load().await);
            for c in moderation.pending.records() {
                println!("{}\t{:?}\t{}\tby {}", c.id, c.kind, c.title, c.created_by);
            }
        }
        AdminCmd::Approve { id, .. } => {
            moderation.load().await;
            let c = moderation.approve(parse_uuid(&id)?).await?;
            println!("{} -> {}", c.id, c.status.as_str());
        }
        AdminCmd::Reject { id, .. } => {
            moderation.load().await;
            let c = moderation.reject(parse_uuid(&id)?).await?;
            println!("{} -> {}", c.id, c.status.as_str());
        }
        AdminCmd::ShowAi { .. } => match ai_settings(&*store, &admin).await? {
            Some(s) => {
                let key = if s.api_key.is_empty() { "(none)" } else { "(set)" };
                println!("provider: {}
endpoint: {}
api key:  {key}", s.provider, s.endpoint);
            }
            None => println!("no AI settings saved"),
        },
        AdminCmd::SetAi {
            provider,
            api_key,
            endpoint,
            ..
        } => {
            let s = save_ai_settings(&*store, &admin, AiSettings::new(&provider, &api_key, &endpoint)).await?;
            println!("saved provider {}", s.provider);
        }
    }
    Ok(())
}

// ===== Helpers =====
/// 1-based index of the current card. Skipped cards leave the queue
/// without counting as reviewed, so this counts from what is left.
fn position(session: &ReviewSession, total: usize) -> usize {
    total - session.remaining() + 1
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).map_err(|_| anyhow!("invalid uuid: {s}"))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| anyhow!("invalid date (want YYYY-MM-DD): {s}"))
}

fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(d) => parse_date(d),
        None => Ok(Local::now().date_naive()),
    }
}

fn prompt_enter(label: &str) -> Result<()> {
    read_line(label).map(|_| ())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if stdin().read_line(&mut s)? == 0 {
        bail!("input closed");
    }
    Ok(s)
}
