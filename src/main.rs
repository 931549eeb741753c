mod cli;

#[cfg(feature = "tui")]
mod tui;

use anyhow::Context;
use clap::Parser;
use llm_cmp::app::{Comparison, Panel};
use llm_cmp::config::{self, Config, SlotConfig};
use llm_cmp::provider::{combine_prompt, ProviderKind};
use llm_cmp::stream::{Phase, StreamSnapshot};
use llm_cmp::{paths, render};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    if let Some(cli::Command::Providers) = args.cmd {
        print_providers();
        return Ok(());
    }

    let config_path = match &args.config {
        Some(p) => p.clone(),
        None => paths::config_path()?,
    };
    let cfg = Config::load_optional(&config_path)?.unwrap_or_default();
    tracing::debug!(?config_path, ?cfg, "resolved config");

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let slot_configs: Vec<SlotConfig> = if args.models.is_empty() {
        cfg.slots.clone()
    } else {
        args.models
            .iter()
            .map(|m| SlotConfig {
                provider: Some(args.provider.clone()),
                model: Some(m.clone()),
                ..SlotConfig::default()
            })
            .collect()
    };
    let slots = config::resolve_slots(&slot_configs, |k| std::env::var(k).ok())?;
    let system_prompt = args
        .system
        .clone()
        .or_else(|| cfg.system_prompt.clone())
        .unwrap_or_default();
    let debug = args.debug || cfg.debug;

    #[cfg(feature = "tui")]
    if let Some(cli::Command::Tui) = args.cmd {
        let cmp = Arc::new(Comparison::new(&http, slots)?);
        return tui::run_tui(cmp, system_prompt, debug).await;
    }

    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        anyhow::bail!("No prompt provided. Try: llm-cmp -m gpt-4 \"Hello\"");
    }
    if slots.is_empty() {
        anyhow::bail!(
            "No slots configured. Pass --model or add [[slot]] entries to {}",
            config_path.display()
        );
    }

    let cmp = Arc::new(Comparison::new(&http, slots)?);
    let timeout = args.timeout.map(Duration::from_secs);
    run_once(cmp, &system_prompt, &prompt, debug, timeout).await
}

async fn run_once(
    cmp: Arc<Comparison>,
    system_prompt: &str,
    user_prompt: &str,
    debug: bool,
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let interrupt = {
        let cmp = cmp.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, stopping all panels");
                cmp.stop_all();
            }
        })
    };

    let deadline = timeout.map(|after| {
        let cmp = cmp.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            tracing::info!(?after, "timeout reached, stopping all panels");
            cmp.stop_all();
        })
    });

    // A single panel is echoed live; several are printed once all finish.
    let live = match cmp.panels() {
        [only] => Some(tokio::spawn(echo(only.consumer.subscribe()))),
        _ => None,
    };

    let phases = cmp.start_all(system_prompt, user_prompt).await?;

    interrupt.abort();
    if let Some(d) = deadline {
        d.abort();
    }
    let echoed = match live {
        Some(handle) => {
            handle.await.ok();
            true
        }
        None => false,
    };

    let prompt = combine_prompt(system_prompt, user_prompt);
    let mut out = std::io::stdout().lock();
    for (i, panel) in cmp.panels().iter().enumerate() {
        print_panel(&mut out, i, panel, &prompt, debug, !echoed)?;
    }

    let failed = phases
        .iter()
        .filter(|p| matches!(p, Phase::Failed(_)))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} panels failed (see log for details)", phases.len());
    }
    Ok(())
}

async fn echo(mut rx: watch::Receiver<StreamSnapshot>) {
    let mut printed = 0usize;
    let mut out = std::io::stdout();
    while rx.changed().await.is_ok() {
        let snap = rx.borrow_and_update().clone();
        if matches!(snap.phase, Phase::Streaming | Phase::Completed) {
            if let Some(new) = snap.text.get(printed..) {
                print!("{new}");
                out.flush().ok();
                printed = snap.text.len();
            }
        }
        if snap.phase.is_terminal() {
            break;
        }
    }
    if printed > 0 {
        println!();
    }
}

fn print_panel(
    out: &mut impl Write,
    index: usize,
    panel: &Panel,
    prompt: &str,
    debug: bool,
    with_text: bool,
) -> anyhow::Result<()> {
    let snap = panel.consumer.snapshot();
    writeln!(out, "== [{}] {} ==", index + 1, panel.slot.title())?;
    if debug {
        for line in render::debug_lines(&panel.slot, prompt) {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "---")?;
    }
    for line in render::status_lines(&panel.slot, &snap) {
        writeln!(out, "{line}")?;
    }
    if with_text {
        writeln!(out, "---")?;
        writeln!(out, "{}", snap.text)?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_providers() {
    for p in ProviderKind::ALL {
        let state = if p.is_implemented() {
            "implemented"
        } else {
            "not implemented"
        };
        println!("{}\t{}\t({state})", p.id(), p.label());
        for m in p.models() {
            println!(
                "  {}\t{} tokens\ttraining data {}",
                m.name, m.max_tokens, m.training_data
            );
        }
    }
}
