use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::engine::{EngineEvent, MentionEngine};
use crate::io::fetch_worker::FetchWorker;
use crate::io::source::MentionSource;
use crate::model::MentionConfig;
use crate::ops::directory::RefreshOutcome;

use super::input;
use super::render;
use super::theme::Theme;

/// State of the interactive description field
pub struct App {
    pub engine: MentionEngine,
    /// Host-owned buffer; the engine only sees copies of it.
    pub text: String,
    /// Caret as a byte offset into `text`
    pub cursor: usize,
    pub theme: Theme,
    pub max_visible: usize,
    /// One-line directory status shown above the field
    pub status: String,
    /// The last refresh failed; the status line is drawn as an error.
    pub status_error: bool,
    pub should_quit: bool,
    /// Where the suggestion list was last drawn (for pointer hit-testing)
    pub popup_area: Option<Rect>,
    /// Where the text field was last drawn
    pub field_area: Option<Rect>,
}

impl App {
    pub fn new(config: &MentionConfig, text: String) -> Self {
        let cursor = text.len();
        let mut app = App {
            engine: MentionEngine::from_config(&config.directory),
            text,
            cursor,
            theme: Theme::from_config(&config.ui),
            max_visible: config.ui.max_visible.max(1),
            status: "loading staff\u{2026}".to_string(),
            status_error: false,
            should_quit: false,
            popup_area: None,
            field_area: None,
        };
        app.sync_engine();
        app
    }

    /// Report the current buffer to the engine.
    pub fn sync_engine(&mut self) {
        self.engine.on_text_changed(&self.text, self.cursor);
    }

    /// Apply outbound engine events to the buffer.
    pub fn apply_engine_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::TextReplaced { text, cursor } => {
                    self.text = text;
                    self.cursor = cursor;
                }
            }
        }
    }

    pub fn note_refresh(&mut self, outcome: &RefreshOutcome) {
        match outcome {
            RefreshOutcome::Applied { count } => {
                info!(count, "staff directory loaded");
                self.status = format!("{} candidates", count);
                self.status_error = false;
            }
            RefreshOutcome::Failed { message } => {
                let cached = self.engine.directory().snapshot().len();
                self.status = format!("staff unavailable ({}), {} cached", message, cached);
                self.status_error = true;
            }
            RefreshOutcome::Discarded(_) => {}
        }
    }
}

/// Run the interactive editor until the user quits. Returns the final text.
pub fn run(
    config: &MentionConfig,
    source: Arc<dyn MentionSource>,
    initial_text: String,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut app = App::new(config, initial_text);
    let worker = FetchWorker::new(source);
    worker.spawn(app.engine.begin_refresh())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &worker);

    app.engine.unmount();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result.map(|_| app.text)
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &FetchWorker,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for done in worker.poll() {
            let outcome = app.engine.on_refresh_completed(&done.ticket, done.result);
            app.note_refresh(&outcome);
        }

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if input::is_refresh(&key) {
                        if let Err(e) = worker.spawn(app.engine.begin_refresh()) {
                            warn!(error = %e, "could not start staff refresh");
                        }
                    } else {
                        input::handle_key(app, key);
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
