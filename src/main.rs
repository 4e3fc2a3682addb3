use std::io;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventOutcome, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokebattle::action::Action;
use pokebattle::api::PokedexClient;
use pokebattle::effect::Effect;
use pokebattle::reducer::reducer;
use pokebattle::state::{
    AppState, DEFAULT_GAME_URL, DEFAULT_LOW_HP_PERCENT, DEFAULT_POKEDEX_URL,
};
use pokebattle::ui;

#[derive(Parser, Debug)]
#[command(name = "pokebattle")]
#[command(about = "Pokedex browser and battle client for the remote game service")]
struct Args {
    /// Pokedex endpoint serving the catalog and per-Pokemon details
    #[arg(long, default_value = DEFAULT_POKEDEX_URL)]
    pokedex_url: String,

    /// Game endpoint adjudicating battles
    #[arg(long, default_value = DEFAULT_GAME_URL)]
    game_url: String,

    /// HP percentage at or below which health renders as low
    #[arg(long, default_value_t = DEFAULT_LOW_HP_PERCENT)]
    low_hp: u8,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        pokedex_url,
        game_url,
        low_hp,
        debug: debug_args,
    } = Args::parse();

    let debug = DebugSession::new(debug_args);
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let state = debug
        .load_state_or_else_async(move || async move { Ok::<AppState, io::Error>(AppState::new(low_hp)) })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let client = Arc::new(PokedexClient::new(pokedex_url, game_url));

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, client, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    client: Arc<PokedexClient>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    debug
        .run_effect_app(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |_runtime| {},
            |frame, area, state, render_ctx: RenderContext| {
                ui::render(frame, area, state, render_ctx);
            },
            |event, state| -> EventOutcome<Action> { ui::handle_event(event, state) },
            |action| matches!(action, Action::Quit),
            move |effect, ctx: &mut EffectContext<Action>| handle_effect(&client, effect, ctx),
        )
        .await
}

/// Handle effects by spawning request tasks; each task resolves to the
/// action carrying its result or its diagnostic message.
fn handle_effect(client: &Arc<PokedexClient>, effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::FetchCatalog => {
            let client = Arc::clone(client);
            ctx.tasks().spawn(TaskKey::new("catalog"), async move {
                match client.fetch_catalog().await {
                    Ok(entries) => Action::CatalogDidLoad(entries),
                    Err(error) => Action::CatalogDidError(error.to_string()),
                }
            });
        }
        Effect::FetchDetail { id } => {
            let client = Arc::clone(client);
            ctx.tasks().spawn(TaskKey::new("detail"), async move {
                match client.fetch_pokemon(&id).await {
                    Ok(detail) => Action::DetailDidLoad(detail),
                    Err(error) => Action::DetailDidError(error.to_string()),
                }
            });
        }
        Effect::StartBattle { name } => {
            let client = Arc::clone(client);
            ctx.tasks().spawn(TaskKey::new("start_game"), async move {
                match client.start_game(&name).await {
                    Ok(start) => Action::BattleDidStart(start),
                    Err(error) => Action::BattleDidError(error.to_string()),
                }
            });
        }
        Effect::PlayMove {
            guid,
            pid,
            move_name,
        } => {
            let client = Arc::clone(client);
            ctx.tasks().spawn(TaskKey::new("play_move"), async move {
                match client.play_move(&guid, &pid, &move_name).await {
                    Ok(report) => Action::TurnDidResolve(report),
                    Err(error) => Action::TurnDidError(error.to_string()),
                }
            });
        }
        Effect::Flee { guid, pid } => {
            let client = Arc::clone(client);
            ctx.tasks().spawn(TaskKey::new("play_move"), async move {
                match client.flee(&guid, &pid).await {
                    Ok(report) => Action::TurnDidResolve(report),
                    Err(error) => Action::TurnDidError(error.to_string()),
                }
            });
        }
    }
}
