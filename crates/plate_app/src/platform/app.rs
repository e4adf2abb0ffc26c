use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use plate_core::{update, AppState, AppViewModel, Msg};
use plate_engine::{IdentityStore, KeyValueStore};
use plate_logging::{plate_info, plate_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::logging;
use super::persistence::RonFileStore;
use super::ui::input::{self, Command, LoginPrompt};
use super::ui::render;

/// Everything the main loop reacts to.
pub enum AppEvent {
    Core(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    config.prepare_state_dir()?;
    logging::initialize(config.log_destination, config.log_level, &config.log_path());
    plate_info!(
        "Starting plate: api={} state_dir={:?}",
        config.api.base_url,
        config.state_dir
    );

    let store = IdentityStore::new(RonFileStore::open(&config.state_dir));
    let (event_tx, event_rx) = mpsc::channel();
    let runner = EffectRunner::new(&config, store, event_tx.clone())?;
    spawn_input_reader(event_tx)?;

    let mut app = App::new(runner);
    let session = app.runner.session();
    app.dispatch(Msg::SessionLoaded(session));
    app.show_frame();
    app.show_prompt();

    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Core(msg) => {
                if app.dispatch(msg) {
                    app.show_prompt();
                }
            }
            AppEvent::Line(line) => {
                let view = app.state.view();
                match input::interpret(&line, &view, &mut app.login_prompt) {
                    Command::Dispatch(msgs) => {
                        for msg in msgs {
                            app.dispatch(msg);
                        }
                    }
                    Command::Quit => break,
                    Command::Ignore => {}
                    Command::Invalid(message) => eprintln!("{message}"),
                }
                app.show_prompt();
            }
            AppEvent::InputClosed => break,
        }
    }

    // Dropping the engine handle cancels any analysis still running.
    drop(app);
    plate_info!("plate exiting");
    Ok(())
}

struct App<S: KeyValueStore> {
    state: AppState,
    runner: EffectRunner<S>,
    last_frame: Option<AppViewModel>,
    login_prompt: LoginPrompt,
}

impl<S: KeyValueStore> App<S> {
    fn new(runner: EffectRunner<S>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            last_frame: None,
            login_prompt: LoginPrompt::default(),
        }
    }

    /// Applies `msg` and prints what changed; returns whether anything was printed.
    fn dispatch(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let notifications = state.take_notifications();
        let was_dirty = state.consume_dirty();
        self.state = state;

        let mut printed = !notifications.is_empty();
        for notification in notifications {
            let line = render::notification_line(notification);
            if render::is_error(notification) {
                plate_warn!("{}", line);
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        if was_dirty {
            printed |= self.show_frame();
        }
        self.runner.enqueue(effects);
        printed
    }

    fn show_frame(&mut self) -> bool {
        let view = self.state.view();
        let lines = render::render(self.last_frame.as_ref(), &view);
        let printed = !lines.is_empty();
        for line in lines {
            println!("{line}");
        }
        self.last_frame = Some(view);
        printed
    }

    fn show_prompt(&self) {
        print!(
            "{}",
            render::prompt(self.state.current_view(), self.login_prompt)
        );
        let _ = io::stdout().flush();
    }
}

fn spawn_input_reader(event_tx: mpsc::Sender<AppEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("plate-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if event_tx.send(AppEvent::Line(line)).is_err() {
                    return;
                }
            }
            let _ = event_tx.send(AppEvent::InputClosed);
        })?;
    Ok(())
}
