use futures_channel::{mpsc, oneshot};
use panel_codec::{encode_batch, encode_positional, power_off_command, power_on_command};
use panel_protocol::{
    Channel, ChannelId, Color, ControlError, DimPreset, Fixture, FixtureBank, NoticeLevel,
    PanelCommand, PanelEvent, PresetTable,
};
use panel_runtime::{actor_debug, actor_warn, Actor, DimmerMessage, LinkMessage};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// How a save reaches the fixtures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// One positional command per enabled fixture; outcomes are independent.
    #[default]
    Fanout,
    /// One JSON document carrying every enabled fixture.
    Batch,
}

struct ActiveDim {
    fixture_id: u16,
    preset: DimPreset,
}

/// DispatchActor runs every panel command through one pipeline
///
/// Responsibilities:
/// - Own the fixture registry and emit a snapshot after each mutation
/// - Validate commands before anything touches the wire
/// - Ask the link actor for a session on demand, then transmit
/// - Surface every outcome as a notice; a skipped command is reported,
///   never silently dropped
///
/// User commands and animator pulses arrive on the same mailbox, so all
/// producers serialize through this one actor and the registry needs no
/// locking.
pub struct DispatchActor {
    bank: FixtureBank,
    presets: PresetTable,
    save_mode: SaveMode,
    link_tx: mpsc::Sender<LinkMessage>,
    dimmer_tx: mpsc::Sender<DimmerMessage>,
    event_tx: mpsc::Sender<PanelEvent>,

    // The sweep target; pulses arriving with no target are stale and dropped
    active_dim: Option<ActiveDim>,

    // Latest animator level. Pulses only announce that this cell changed,
    // so pulses backed up behind a slow send all resolve to the newest
    // level instead of replaying the queue
    dim_level: watch::Receiver<u8>,
}

impl DispatchActor {
    pub fn new(
        bank: FixtureBank,
        presets: PresetTable,
        save_mode: SaveMode,
        link_tx: mpsc::Sender<LinkMessage>,
        dimmer_tx: mpsc::Sender<DimmerMessage>,
        event_tx: mpsc::Sender<PanelEvent>,
        dim_level: watch::Receiver<u8>,
    ) -> Self {
        Self {
            bank,
            presets,
            save_mode,
            link_tx,
            dimmer_tx,
            event_tx,
            active_dim: None,
            dim_level,
        }
    }

    /// Panel notifications are drop-tolerant; a full event queue must never
    /// stall command handling.
    fn send_panel_event(&self, event: PanelEvent) {
        if let Err(e) = self.event_tx.clone().try_send(event) {
            actor_warn!("Panel event dropped: {:?}", e);
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.send_panel_event(PanelEvent::notice(level, message));
    }

    fn send_snapshot(&self) {
        self.send_panel_event(PanelEvent::FixturesChanged {
            fixtures: self.bank.to_vec(),
        });
    }

    /// Send a CRITICAL message to the dimmer
    ///
    /// If the channel is closed, the dimmer has crashed or shut down.
    /// If the channel is full, the engine is overloaded. Both propagate.
    fn send_dimmer(&self, msg: DimmerMessage) -> Result<(), ControlError> {
        self.dimmer_tx.clone().try_send(msg).map_err(|e| {
            if e.is_disconnected() {
                ControlError::ChannelClosed("DimmerActor has shut down".into())
            } else {
                ControlError::Other("DimmerActor channel overloaded".into())
            }
        })
    }

    /// Round-trip to the link actor: connect if disconnected, then confirm.
    async fn ensure_link(&mut self) -> Result<(), ControlError> {
        let (reply, ensured) = oneshot::channel();
        self.link_tx
            .clone()
            .try_send(LinkMessage::EnsureConnected { reply })
            .map_err(|_| ControlError::ChannelClosed("LinkActor has shut down".into()))?;
        ensured
            .await
            .map_err(|_| ControlError::ChannelClosed("LinkActor dropped the reply".into()))?
    }

    /// Round-trip to the link actor: publish one payload on the command
    /// topic. The outcome is the transport outcome, not a queue receipt.
    async fn publish_link(&mut self, payload: Vec<u8>) -> Result<(), ControlError> {
        let (reply, published) = oneshot::channel();
        self.link_tx
            .clone()
            .try_send(LinkMessage::Publish { payload, reply })
            .map_err(|_| ControlError::ChannelClosed("LinkActor has shut down".into()))?;
        published
            .await
            .map_err(|_| ControlError::ChannelClosed("LinkActor dropped the reply".into()))?
    }

    async fn transmit(&mut self, payload: Vec<u8>) -> Result<(), ControlError> {
        self.ensure_link().await?;
        self.publish_link(payload).await
    }

    /// Turn a failed transmit into a panel notice. Connection outcomes are
    /// expected and never bubble further; channel breakage does.
    fn report_undelivered(&self, what: &str, error: ControlError) -> Result<(), ControlError> {
        match error {
            ControlError::NotConnected(reason) => {
                self.notice(
                    NoticeLevel::Warning,
                    format!("{what} not sent: {reason}. Try again."),
                );
                Ok(())
            }
            ControlError::Transport(_) => {
                // The link actor already reported why the attempt failed;
                // name the command that fell victim to it
                self.notice(
                    NoticeLevel::Warning,
                    format!("{what} not sent: the connection attempt failed."),
                );
                Ok(())
            }
            ControlError::Transmission(reason) => {
                self.notice(NoticeLevel::Error, format!("{what} failed: {reason}"));
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Transmit one payload for a command; returns whether it was delivered.
    async fn try_deliver(&mut self, what: &str, payload: Vec<u8>) -> Result<bool, ControlError> {
        match self.transmit(payload).await {
            Ok(()) => Ok(true),
            Err(e) => {
                self.report_undelivered(what, e)?;
                Ok(false)
            }
        }
    }

    fn require_fixture(&self, id: u16) -> Result<&Fixture, ControlError> {
        self.bank.get(id).ok_or(ControlError::UnknownFixture(id))
    }

    fn handle_set_channel(
        &mut self,
        id: u16,
        channel: ChannelId,
        raw: &str,
    ) -> Result<(), ControlError> {
        let fixture = self.require_fixture(id)?;
        let color = fixture.color.with_channel(channel, Channel::parse(raw));
        self.bank = self.bank.set_color(id, color);
        self.send_snapshot();
        Ok(())
    }

    fn handle_set_color(&mut self, id: u16, color: Color) -> Result<(), ControlError> {
        self.require_fixture(id)?;
        self.bank = self.bank.set_color(id, color);
        self.send_snapshot();
        Ok(())
    }

    fn handle_toggle_enabled(&mut self, id: u16) -> Result<(), ControlError> {
        self.require_fixture(id)?;
        self.bank = self.bank.toggle_enabled(id);
        self.send_snapshot();
        Ok(())
    }

    async fn handle_toggle_powered(&mut self, id: u16) -> Result<(), ControlError> {
        let powered = !self.require_fixture(id)?.powered;
        self.bank = self.bank.toggle_powered(id);
        self.send_snapshot();

        // The stored color survives power flips; on simply raises the white
        // channel, off darkens everything
        let payload = if powered {
            power_on_command(id)
        } else {
            power_off_command(id)
        };
        self.try_deliver("Power command", payload.into_bytes())
            .await?;
        Ok(())
    }

    async fn handle_apply_preset(&mut self, id: u16, name: &str) -> Result<(), ControlError> {
        self.require_fixture(id)?;
        let Some(preset) = self.presets.solid(name).cloned() else {
            self.notice(NoticeLevel::Warning, format!("Unknown preset: {name}"));
            return Ok(());
        };

        let color = preset.color();
        self.bank = self.bank.set_color(id, Color::from(color));
        self.send_snapshot();

        let payload = encode_positional(id, color).into_bytes();
        if self.try_deliver("Preset", payload).await? {
            self.notice(
                NoticeLevel::Success,
                format!("Applied '{}' to fixture {id}", preset.name),
            );
        }
        Ok(())
    }

    async fn handle_save_all(&mut self) -> Result<(), ControlError> {
        let enabled: Vec<Fixture> = self.bank.enabled().cloned().collect();
        if enabled.is_empty() {
            self.notice(NoticeLevel::Info, "Nothing to save: no fixtures are enabled.");
            return Ok(());
        }

        // The whole roster is validated before anything is sent
        if enabled.iter().any(|fixture| !fixture.color.is_complete()) {
            self.notice(NoticeLevel::Error, "Please fill in all fields.");
            return Ok(());
        }

        match self.save_mode {
            SaveMode::Batch => {
                let payload = encode_batch(&enabled)?.into_bytes();
                match self.transmit(payload).await {
                    Ok(()) => self.notice(NoticeLevel::Success, "Saved."),
                    Err(e) => self.report_undelivered("Save", e)?,
                }
            }
            SaveMode::Fanout => {
                // One session check for the whole roster, then every fixture
                // gets its own send and its own outcome
                if let Err(e) = self.ensure_link().await {
                    return self.report_undelivered("Save", e);
                }

                let total = enabled.len();
                let mut delivered = 0usize;
                for fixture in &enabled {
                    let Some(color) = fixture.color.complete() else {
                        continue;
                    };
                    let payload = encode_positional(fixture.id, color).into_bytes();
                    match self.publish_link(payload).await {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            self.report_undelivered(&format!("Save for fixture {}", fixture.id), e)?
                        }
                    }
                }

                if delivered == total {
                    self.notice(NoticeLevel::Success, "Saved.");
                } else {
                    self.notice(
                        NoticeLevel::Warning,
                        format!("Saved {delivered} of {total} fixtures."),
                    );
                }
            }
        }
        Ok(())
    }

    fn handle_start_dim(&mut self, id: u16, name: &str) -> Result<(), ControlError> {
        self.require_fixture(id)?;
        let Some(preset) = self.presets.dim(name).cloned() else {
            self.notice(NoticeLevel::Warning, format!("Unknown dim preset: {name}"));
            return Ok(());
        };

        self.notice(
            NoticeLevel::Info,
            format!("Dimming fixture {id} with '{}'", preset.name),
        );
        self.active_dim = Some(ActiveDim {
            fixture_id: id,
            preset,
        });
        self.send_dimmer(DimmerMessage::Start)
    }

    fn handle_stop_dim(&mut self) -> Result<(), ControlError> {
        if self.active_dim.take().is_some() {
            self.send_dimmer(DimmerMessage::Stop)?;
            self.notice(NoticeLevel::Info, "Dimming stopped");
        }
        Ok(())
    }

    async fn handle_dim_pulse(&mut self) -> Result<(), ControlError> {
        let Some((fixture_id, base)) = self
            .active_dim
            .as_ref()
            .map(|active| (active.fixture_id, active.preset.color()))
        else {
            // Pulses can trail a StopDim that already cleared the sweep
            actor_debug!("Dropping dim pulse with no active sweep");
            return Ok(());
        };

        // An earlier pulse in the same backlog already took this level out;
        // superseded wake-ups must not reach the wire
        let brightness = match self.dim_level.has_changed() {
            Ok(true) => *self.dim_level.borrow_and_update(),
            Ok(false) => {
                actor_debug!("Dropping superseded dim pulse");
                return Ok(());
            }
            Err(_) => {
                actor_debug!("Dropping dim pulse from a departed sweep");
                return Ok(());
            }
        };

        let payload = encode_positional(fixture_id, base.scaled(brightness)).into_bytes();
        // Failures are reported; successes stay quiet at 5 Hz
        self.try_deliver("Dim pulse", payload).await?;
        self.send_panel_event(PanelEvent::DimLevel { brightness });
        Ok(())
    }

    async fn handle_shutdown(&mut self) -> Result<(), ControlError> {
        self.active_dim = None;
        let _ = self.dimmer_tx.clone().try_send(DimmerMessage::Stop);

        let (done, confirmation) = oneshot::channel();
        if self
            .link_tx
            .clone()
            .try_send(LinkMessage::Shutdown { done })
            .is_ok()
        {
            // The link confirms only after the session is released
            let _ = confirmation.await;
        }
        actor_debug!("Link released for shutdown");
        Ok(())
    }
}

impl Actor for DispatchActor {
    type Message = PanelCommand;

    fn name(&self) -> &'static str {
        "DispatchActor"
    }

    async fn init(&mut self) -> Result<(), ControlError> {
        // The panel needs the roster before the first command
        self.send_snapshot();
        Ok(())
    }

    async fn handle(&mut self, msg: PanelCommand) -> Result<(), ControlError> {
        match msg {
            PanelCommand::SetChannel { id, channel, raw } => {
                self.handle_set_channel(id, channel, &raw)?
            }
            PanelCommand::SetColor { id, color } => self.handle_set_color(id, color)?,
            PanelCommand::ToggleEnabled { id } => self.handle_toggle_enabled(id)?,
            PanelCommand::TogglePowered { id } => self.handle_toggle_powered(id).await?,
            PanelCommand::SelectFixture { id } => {
                self.bank = self.bank.upsert(id);
                self.send_snapshot();
            }
            PanelCommand::ApplyPreset { id, name } => self.handle_apply_preset(id, &name).await?,
            PanelCommand::SaveAll => self.handle_save_all().await?,
            PanelCommand::StartDim { id, name } => self.handle_start_dim(id, &name)?,
            PanelCommand::StopDim => self.handle_stop_dim()?,
            PanelCommand::DimPulse => self.handle_dim_pulse().await?,
            PanelCommand::Shutdown => self.handle_shutdown().await?,
        }
        Ok(())
    }
}
