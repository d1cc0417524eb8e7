use std::future::Future;

use futures::stream::StreamExt;
use futures_channel::mpsc;
use panel_protocol::{ControlError, NoticeLevel, PanelEvent};

/// Actor trait for implementing message-driven components
///
/// Actors are independent, stateful components that communicate through
/// message passing. Each actor has its own mailbox and processes messages
/// sequentially, so no actor state ever needs a lock.
///
/// # Lifecycle
///
/// 1. **init()** - Called once before message processing starts
/// 2. **handle()** - Called for each received message
/// 3. **shutdown()** - Called when the actor is stopping
///
/// # Error Surfacing
///
/// A handler returning `Err` does not stop the actor. The error is turned
/// into an error notice on the event channel so the panel can show it, and
/// the actor keeps processing its mailbox.
///
/// The lifecycle methods are declared as `Send` futures (desugared rather
/// than `async fn` sugar) so `run` can be handed to `tokio::spawn` on a
/// multithreaded runtime; implementors still write plain `async fn`.
///
/// # Example
///
/// ```ignore
/// struct MyActor {
///     state: u32,
///     event_tx: mpsc::Sender<PanelEvent>,
/// }
///
/// impl Actor for MyActor {
///     type Message = MyMessage;
///
///     fn name(&self) -> &'static str {
///         "MyActor"
///     }
///
///     async fn handle(&mut self, msg: Self::Message) -> Result<(), ControlError> {
///         // Process message
///         Ok(())
///     }
/// }
/// ```
pub trait Actor: Send + 'static {
    /// Message type this actor processes
    type Message: Send + 'static;

    /// Actor name (used for logging and notices)
    fn name(&self) -> &'static str;

    /// Initialize the actor before processing messages
    ///
    /// Called once when the actor starts. Use this to set up resources
    /// or perform initial configuration.
    fn init(&mut self) -> impl Future<Output = Result<(), ControlError>> + Send {
        async { Ok(()) }
    }

    /// Handle a single message
    ///
    /// This is called for each message received by the actor.
    /// Messages are processed sequentially in the order received.
    fn handle(
        &mut self,
        msg: Self::Message,
    ) -> impl Future<Output = Result<(), ControlError>> + Send;

    /// Clean up before shutdown
    ///
    /// Called when the actor's mailbox closes. Use this to release
    /// sessions, stop timers, or drop tasks.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Main actor run loop (provided by runtime)
    ///
    /// This method consumes the actor and runs it to completion.
    /// It handles initialization, message processing, and shutdown.
    ///
    /// # Arguments
    ///
    /// * `rx` - Mailbox to receive messages from
    /// * `event_tx` - Channel to send panel events to
    fn run(
        mut self,
        mut rx: mpsc::Receiver<Self::Message>,
        event_tx: mpsc::Sender<PanelEvent>,
    ) -> impl Future<Output = ()> + Send
    where
        Self: Sized,
    {
        async move {
            // Initialize
            if let Err(e) = self.init().await {
                let _ = event_tx.clone().try_send(PanelEvent::notice(
                    NoticeLevel::Error,
                    format!("{} init failed: {}", self.name(), e),
                ));
                return;
            }

            #[cfg(debug_assertions)]
            eprintln!("{} started", self.name());

            // Process messages
            while let Some(msg) = rx.next().await {
                if let Err(e) = self.handle(msg).await {
                    let _ = event_tx.clone().try_send(PanelEvent::notice(
                        NoticeLevel::Error,
                        format!("{} error: {}", self.name(), e),
                    ));
                }
            }

            // Shutdown
            self.shutdown().await;

            #[cfg(debug_assertions)]
            eprintln!("{} stopped", self.name());
        }
    }
}

/// Spawn an actor onto the current tokio runtime
///
/// The returned handle resolves once the actor has drained its mailbox and
/// finished its shutdown hook.
pub fn spawn_actor<A>(
    actor: A,
    rx: mpsc::Receiver<A::Message>,
    event_tx: mpsc::Sender<PanelEvent>,
) -> tokio::task::JoinHandle<()>
where
    A: Actor,
{
    tokio::spawn(actor.run(rx, event_tx))
}
