#![cfg(feature = "tui")]

use anyhow::Context;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use llm_cmp::app::Comparison;
use llm_cmp::provider::combine_prompt;
use llm_cmp::render;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

const HELP: &str = "Enter: generate (all) | Ctrl-S: stop | Ctrl-L: clear | /system <text> | /debug | Esc: quit";

struct UiState {
    input: String,
    system_prompt: String,
    last_prompt: String,
    debug: bool,
    notice: Option<String>,
    generation: Option<tokio::task::JoinHandle<()>>,
}

pub async fn run_tui(cmp: Arc<Comparison>, system_prompt: String, debug: bool) -> anyhow::Result<()> {
    if cmp.panels().is_empty() {
        anyhow::bail!("No slots configured. Pass --model or add [[slot]] entries to config.toml");
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle("LLM-CMP")).context("enter alt screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel::<Event>();
    std::thread::spawn(move || {
        while let Ok(ev) = crossterm::event::read() {
            if ev_tx.send(ev).is_err() {
                break;
            }
        }
    });

    let mut state = UiState {
        input: String::new(),
        system_prompt,
        last_prompt: String::new(),
        debug,
        notice: None,
        generation: None,
    };
    let mut was_generating = false;

    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(33));

    let res = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let generating = cmp.is_generating();
                if generating != was_generating {
                    let title = if generating { "LLM-CMP (*)" } else { "LLM-CMP" };
                    execute!(terminal.backend_mut(), SetTitle(title)).ok();
                    was_generating = generating;
                }
                if let Err(e) = draw(&mut terminal, &cmp, &state) {
                    break Err(e);
                }
            }
            Some(ev) = ev_rx.recv() => {
                if let Event::Key(key) = ev {
                    if handle_key(key, &cmp, &mut state) {
                        break Ok(());
                    }
                }
            }
        }
    };

    cmp.stop_all();
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

/// Returns true when the UI should exit.
fn handle_key(key: KeyEvent, cmp: &Arc<Comparison>, state: &mut UiState) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return true,
            KeyCode::Char('s') => {
                cmp.stop_all();
                return false;
            }
            KeyCode::Char('l') => {
                cmp.clear_all();
                state.notice = None;
                return false;
            }
            _ => return false,
        }
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Char(c) => state.input.push(c),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Enter => {
            let msg = state.input.trim().to_string();
            state.input.clear();
            if msg.is_empty() {
                return false;
            }

            if msg == "/quit" {
                return true;
            }
            if msg == "/debug" {
                state.debug = !state.debug;
                return false;
            }
            if let Some(rest) = msg.strip_prefix("/system") {
                state.system_prompt = rest.trim().to_string();
                let chars = state.system_prompt.chars().count();
                state.notice = Some(format!("system prompt set ({chars} chars)"));
                return false;
            }

            if state.generation.as_ref().is_some_and(|h| !h.is_finished()) {
                state.notice = Some("(generation in progress; Ctrl-S to stop)".to_string());
                return false;
            }

            state.notice = None;
            state.last_prompt = combine_prompt(&state.system_prompt, &msg);
            let cmp = cmp.clone();
            let system = state.system_prompt.clone();
            state.generation = Some(tokio::spawn(async move {
                if let Err(e) = cmp.start_all(&system, &msg).await {
                    let error = format!("{e:#}");
                    tracing::warn!(%error, "generation task failed");
                }
            }));
        }
        _ => {}
    }

    false
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cmp: &Comparison,
    state: &UiState,
) -> anyhow::Result<()> {
    terminal.draw(|f| {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3), Constraint::Length(1)])
            .split(f.area());

        let panels = cmp.panels();
        let n = panels.len() as u32;
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(panels.iter().map(|_| Constraint::Ratio(1, n)))
            .split(rows[0]);

        for (panel, area) in panels.iter().zip(columns.iter()) {
            let snap = panel.consumer.snapshot();
            let bold = Style::default().add_modifier(Modifier::BOLD);

            let mut text = Text::default();
            if state.debug {
                for l in render::debug_lines(&panel.slot, &state.last_prompt) {
                    text.lines.push(Line::styled(l, Style::default().add_modifier(Modifier::ITALIC)));
                }
                text.lines.push(Line::from(""));
            }
            for l in render::status_lines(&panel.slot, &snap) {
                text.lines.push(Line::styled(l, bold));
            }
            text.lines.push(Line::from(""));
            text.lines.extend(Text::from(snap.text.clone()).lines);

            let title = if snap.is_generating() {
                format!("{} (*)", panel.slot.title())
            } else {
                panel.slot.title()
            };
            let w = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false });
            f.render_widget(w, *area);
        }

        let input_title = if state.system_prompt.is_empty() {
            "user prompt".to_string()
        } else {
            format!(
                "user prompt (system: {} chars)",
                state.system_prompt.chars().count()
            )
        };
        let input_w = Paragraph::new(state.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(input_title));
        f.render_widget(input_w, rows[1]);

        let footer = state.notice.as_deref().unwrap_or(HELP);
        f.render_widget(Paragraph::new(footer), rows[2]);

        let x = rows[1].x + 1 + state.input.chars().count() as u16;
        let y = rows[1].y + 1;
        f.set_cursor_position((x.min(rows[1].x + rows[1].width.saturating_sub(2)), y));
    })?;
    Ok(())
}
