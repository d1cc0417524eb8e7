//! Line parser for the interactive console.
//!
//! Raw channel values pass through unparsed; the dispatcher owns the
//! clamp-or-unset rules, and the console must not second-guess them.

use panel_protocol::{Channel, ChannelId, Color, PanelCommand};

/// What one input line asks for.
#[derive(Debug, Clone)]
pub enum ReplAction {
    /// Hand the command to the engine.
    Command(PanelCommand),
    /// Print the command list.
    Help,
    /// Print the cached fixture roster.
    Roster,
    /// Print the current link state.
    LinkStatus,
    /// Leave the console.
    Quit,
    /// Blank line.
    Nothing,
}

pub fn help_text() -> &'static str {
    "Commands:
  set <id> <r|g|b|w> [value]   edit one channel; no value clears it
  color <id> <r> <g> <b> <w>   set all four channels
  preset <id> <name>           apply a named solid preset
  toggle <id>                  include or exclude the fixture from saves
  power <id>                   switch the fixture on or off
  select <id>                  focus a fixture, provisioning it if new
  save                         send every enabled fixture
  dim <id> <name>              start the brightness sweep on a dim preset
  stop                         stop the brightness sweep
  list                         show the fixture roster
  state                        show the link state
  quit                         exit"
}

pub fn parse_line(line: &str) -> Result<ReplAction, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ReplAction::Nothing);
    };
    let rest: Vec<&str> = words.collect();

    match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => Ok(ReplAction::Help),
        "list" | "ls" => Ok(ReplAction::Roster),
        "state" | "status" => Ok(ReplAction::LinkStatus),
        "quit" | "exit" => Ok(ReplAction::Quit),
        "save" => Ok(ReplAction::Command(PanelCommand::SaveAll)),
        "stop" => Ok(ReplAction::Command(PanelCommand::StopDim)),
        "set" => parse_set(&rest),
        "color" => parse_color(&rest),
        "toggle" | "enable" => {
            let id = parse_id(rest.first(), "toggle <id>")?;
            Ok(ReplAction::Command(PanelCommand::ToggleEnabled { id }))
        }
        "power" => {
            let id = parse_id(rest.first(), "power <id>")?;
            Ok(ReplAction::Command(PanelCommand::TogglePowered { id }))
        }
        "select" => {
            let id = parse_id(rest.first(), "select <id>")?;
            Ok(ReplAction::Command(PanelCommand::SelectFixture { id }))
        }
        "preset" => {
            let (id, name) = parse_id_and_name(&rest, "preset <id> <name>")?;
            Ok(ReplAction::Command(PanelCommand::ApplyPreset { id, name }))
        }
        "dim" => {
            let (id, name) = parse_id_and_name(&rest, "dim <id> <name>")?;
            Ok(ReplAction::Command(PanelCommand::StartDim { id, name }))
        }
        other => Err(format!(
            "Unknown command '{other}'. Type 'help' for the command list."
        )),
    }
}

fn parse_id(word: Option<&&str>, usage: &str) -> Result<u16, String> {
    let word = word.ok_or_else(|| format!("Usage: {usage}"))?;
    word.parse::<u16>()
        .map_err(|_| format!("Fixture id must be a number, got '{word}'"))
}

/// Preset names may contain spaces, so everything after the id joins back
/// into one name.
fn parse_id_and_name(rest: &[&str], usage: &str) -> Result<(u16, String), String> {
    let (first, name_words) = rest
        .split_first()
        .ok_or_else(|| format!("Usage: {usage}"))?;
    let id = parse_id(Some(first), usage)?;
    if name_words.is_empty() {
        return Err(format!("Usage: {usage}"));
    }
    Ok((id, name_words.join(" ")))
}

fn parse_set(rest: &[&str]) -> Result<ReplAction, String> {
    let usage = "set <id> <r|g|b|w> [value]";
    let id = parse_id(rest.first(), usage)?;
    let channel: ChannelId = rest
        .get(1)
        .ok_or_else(|| format!("Usage: {usage}"))?
        .parse()
        .map_err(|e| format!("{e}"))?;
    // A missing value is an explicit clear
    let raw = rest.get(2).copied().unwrap_or("").to_string();
    Ok(ReplAction::Command(PanelCommand::SetChannel {
        id,
        channel,
        raw,
    }))
}

fn parse_color(rest: &[&str]) -> Result<ReplAction, String> {
    let usage = "color <id> <r> <g> <b> <w>";
    let id = parse_id(rest.first(), usage)?;
    let levels = rest.get(1..5).ok_or_else(|| format!("Usage: {usage}"))?;
    let &[red, green, blue, white] = levels else {
        return Err(format!("Usage: {usage}"));
    };
    let color = Color {
        red: Channel::parse(red),
        green: Channel::parse(green),
        blue: Channel::parse(blue),
        white: Channel::parse(white),
    };
    Ok(ReplAction::Command(PanelCommand::SetColor { id, color }))
}
