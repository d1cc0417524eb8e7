mod args;
mod config;
mod repl;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use control_actors::{DimmerActor, DispatchActor, LinkActor};
use futures::stream::StreamExt;
use panel_protocol::{
    Channel, Color, Fixture, FixtureBank, LinkState, NoticeLevel, PanelCommand, PanelEvent,
    PresetTable,
};
use panel_runtime::{spawn_actor, ChannelManager};
use panel_transport::{BridgeTransport, MqttTransport, Transport};
use tokio::io::AsyncBufReadExt;
use tokio::sync::watch;

use args::ConsoleArgs;
use config::{PanelConfig, SessionKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ConsoleArgs::parse();
    let mut config = PanelConfig::load(&args.config)?;
    if let Some(url) = &args.url {
        config.override_url(url)?;
    }
    let presets = load_presets(&args, &config)?;

    println!("Lighting panel console. Type 'help' for commands.");
    println!("Target: {} on '{}'", config.broker.url, config.topic);

    match config.session_kind()? {
        SessionKind::Broker => run_engine(MqttTransport::new(), config, presets).await,
        SessionKind::Bridge => run_engine(BridgeTransport::new(), config, presets).await,
    }
}

fn load_presets(args: &ConsoleArgs, config: &PanelConfig) -> anyhow::Result<PresetTable> {
    let path = args.presets.as_ref().or(config.presets_file.as_ref());
    let Some(path) = path else {
        return Ok(PresetTable::builtin());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read preset file {}", path.display()))?;
    let table: PresetTable = serde_json::from_str(&text)
        .with_context(|| format!("parse preset file {}", path.display()))?;
    Ok(table)
}

/// Wire up the actors over the chosen transport and drive them from stdin.
async fn run_engine<T: Transport + 'static>(
    transport: T,
    config: PanelConfig,
    presets: PresetTable,
) -> anyhow::Result<()> {
    let (mut manager, handles) = ChannelManager::new();

    let link = LinkActor::new(
        transport,
        config.broker.connect_options(),
        config.topic.clone(),
        manager.link_sender(),
        handles.event_tx.clone(),
    );
    let (level_tx, level_rx) = watch::channel(0);
    let dispatch = DispatchActor::new(
        FixtureBank::provision(config.fixtures),
        presets,
        config.save_mode,
        manager.link_sender(),
        manager.dimmer_sender(),
        handles.event_tx.clone(),
        level_rx,
    );
    let dimmer = DimmerActor::new(manager.dispatch_sender(), level_tx);

    spawn_actor(link, handles.link_rx, handles.event_tx.clone());
    spawn_actor(dispatch, handles.dispatch_rx, handles.event_tx.clone());
    spawn_actor(dimmer, handles.dimmer_rx, handles.event_tx);

    // The console caches the latest snapshots so `list` and `state` need no
    // round-trip into the engine
    let view = Arc::new(Mutex::new(PanelView::default()));
    let printer_view = Arc::clone(&view);
    let mut event_rx = manager.take_event_receiver();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.next().await {
            print_event(&event, &printer_view);
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                match line.context("read from stdin")? {
                    Some(text) => {
                        if !handle_line(&manager, &view, &text) {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // The dispatcher releases the session while handling Shutdown; the
    // pause lets that land before the runtime tears the tasks down
    let _ = manager.send_command(PanelCommand::Shutdown);
    tokio::time::sleep(Duration::from_millis(250)).await;
    printer.abort();
    println!("Bye.");
    Ok(())
}

/// Latest engine snapshots, fed by the event printer.
struct PanelView {
    roster: Vec<Fixture>,
    link: LinkState,
}

impl Default for PanelView {
    fn default() -> Self {
        PanelView {
            roster: Vec::new(),
            link: LinkState::Disconnected,
        }
    }
}

/// Returns false when the console should exit.
fn handle_line(manager: &ChannelManager, view: &Arc<Mutex<PanelView>>, text: &str) -> bool {
    match repl::parse_line(text) {
        Ok(repl::ReplAction::Nothing) => {}
        Ok(repl::ReplAction::Help) => println!("{}", repl::help_text()),
        Ok(repl::ReplAction::Roster) => {
            if let Ok(view) = view.lock() {
                print_roster(&view.roster);
            }
        }
        Ok(repl::ReplAction::LinkStatus) => {
            if let Ok(view) = view.lock() {
                println!("* link: {}", view.link.status_text());
            }
        }
        Ok(repl::ReplAction::Quit) => return false,
        Ok(repl::ReplAction::Command(command)) => {
            if let Err(message) = manager.send_command(command) {
                eprintln!("[error] {message}");
            }
        }
        Err(message) => eprintln!("[error] {message}"),
    }
    true
}

fn print_event(event: &PanelEvent, view: &Arc<Mutex<PanelView>>) {
    match event {
        PanelEvent::Notice { level, message } => {
            println!("[{}] {message}", level_tag(*level));
        }
        PanelEvent::StateChanged { state } => {
            println!("* link: {}", state.status_text());
            if let Ok(mut view) = view.lock() {
                view.link = *state;
            }
        }
        PanelEvent::FixturesChanged { fixtures } => {
            if let Ok(mut view) = view.lock() {
                view.roster = fixtures.clone();
            }
        }
        PanelEvent::DimLevel { brightness } => {
            println!("* dim {brightness}%");
        }
    }
}

fn level_tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    }
}

fn print_roster(fixtures: &[Fixture]) {
    if fixtures.is_empty() {
        println!("No fixtures yet.");
        return;
    }
    for fixture in fixtures {
        println!(
            "  {:>3}  {:<12} {:>8}  {:>3}  {}",
            fixture.id,
            fixture.label,
            if fixture.enabled { "enabled" } else { "disabled" },
            if fixture.powered { "on" } else { "off" },
            color_text(&fixture.color),
        );
    }
}

fn color_text(color: &Color) -> String {
    format!(
        "r={} g={} b={} w={}",
        channel_text(color.red),
        channel_text(color.green),
        channel_text(color.blue),
        channel_text(color.white)
    )
}

fn channel_text(channel: Channel) -> String {
    match channel.level() {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}
