use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, List, Paragraph},
    Frame, Terminal,
};
use std::{
    error::Error,
    io,
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

use echosight::bus::Bus;
use echosight::detection::Sector;
use echosight::haptics::NullActuator;
use echosight::session::{Phase, Session};
use echosight::transcript::EchoResponder;

type MonitorSession = Session<NullActuator, EchoResponder>;

struct App {
    bus: Bus,
    session: MonitorSession,
    text_rx: Receiver<String>,
    last_narration: String,
}

impl App {
    fn new(bus: Bus, session: MonitorSession, text_rx: Receiver<String>) -> App {
        App {
            bus,
            session,
            text_rx,
            last_narration: String::new(),
        }
    }

    fn on_tick(&mut self) {
        while let Some(message) = self.bus.next() {
            self.session.handle(message);
        }
        while let Ok(text) = self.text_rx.try_recv() {
            self.last_narration = text;
        }
    }
}

pub fn engage_gui(
    bus: Bus,
    session: MonitorSession,
    text_rx: Receiver<String>,
) -> Result<(), Box<dyn Error>> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(250);
    let app = App::new(bus, session, text_rx);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let KeyCode::Char('q') = key.code {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(5)])
        .split(f.size());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);

    let active = app.session.active();
    let commands = app.session.last_commands();

    for (pane, sector) in panes.iter().zip(Sector::ALL) {
        let looking = active == Some(sector);
        let warn = commands[sector.index()].is_on();

        let mut title = sector.to_string();
        if looking {
            title.push_str(" <<");
        }
        if warn {
            title.push_str(" !!");
        }
        let border = if warn {
            Style::default().fg(Color::Red)
        } else if looking {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };

        let items: Vec<String> = app
            .session
            .frame()
            .sector(sector)
            .counts
            .iter()
            .map(|(label, count)| format!("{} x{}", label, count))
            .collect();
        let list = List::new(items).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border),
        );
        f.render_widget(list, *pane);
    }

    let belt = commands
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" | ");
    let phase = match app.session.phase() {
        Phase::AwaitingFirstFrame => "awaiting first frame",
        Phase::Ready => "ready",
    };
    let status = Paragraph::new(vec![
        Line::from(format!("narration: {}", app.last_narration)),
        Line::from(format!("belt: {}", belt)),
        Line::from(format!("phase: {}  (press q to quit)", phase)),
    ])
    .block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(status, rows[1]);
}
