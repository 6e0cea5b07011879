use std::{io, io::stdout, path::PathBuf};

use crossterm::{
    event::{self, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};

/// Full-screen picker over the available serial devices. Returns the
/// chosen port, or `None` when there is nothing to pick or the user
/// quits without choosing.
pub fn select_device(
    mut available_ports: Vec<PathBuf>,
    prompt: &str,
) -> io::Result<Option<PathBuf>> {
    if available_ports.is_empty() {
        return Ok(None);
    }

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let n_ports = available_ports.len();
    let mut cursor = 0;
    let mut list_state = ListState::default().with_selected(Some(cursor));
    let mut chosen = None;
    loop {
        let title = Title::from(prompt.to_owned().cyan().bold());
        let instructions = Title::from(Line::from(vec![
            " Move ".into(),
            "<Up>/<Down>".cyan().bold(),
            " Choose ".into(),
            "<Enter>".cyan().bold(),
            " Skip ".into(),
            "<Q> ".cyan().bold(),
        ]));
        let block = Block::default()
            .title(title.alignment(Alignment::Center))
            .title(
                instructions
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL);
        let port_names = available_ports.iter().map(|p| p.to_string_lossy());
        let list = List::new(port_names)
            .style(Style::default().fg(Color::White))
            .highlight_symbol("> ")
            .highlight_style(Style::default().fg(Color::Cyan))
            .block(block);
        list_state.select(Some(cursor));
        terminal.draw(|frame| {
            let area = frame.size();
            frame.render_stateful_widget(list, area, &mut list_state);
        })?;
        if event::poll(std::time::Duration::from_millis(16))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Down => cursor = (cursor + 1) % n_ports,
                        KeyCode::Up => cursor = (cursor + n_ports - 1) % n_ports,
                        KeyCode::Enter => {
                            chosen = Some(cursor);
                            break;
                        }
                        KeyCode::Char('q') => break,
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(chosen.map(|i| available_ports.swap_remove(i)))
}
