//! rhino-panel entry point.
//!
//! Connects to a device, mounts the configured dashboard and logs it as a
//! table on an interval. Typing a button label on stdin triggers that
//! button; `label message` sends the button's code with a custom message.

use tokio::io::{AsyncBufReadExt, BufReader};

use rhino_panel::client::{ConnectionRegistry, Dashboard, Delivery};
use rhino_panel::config::{PanelConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PanelConfig::from_env();
    init_tracing(config.log_format);

    let registry = ConnectionRegistry::new();
    let conn = registry.acquire(&config.endpoint, &config.connect_options())?;
    conn.on_open(|epoch| tracing::info!(epoch, "device connected"));

    let dashboard = Dashboard::mount(&conn, &config.layout());
    let labels: Vec<&str> = dashboard.buttons().iter().map(|b| b.label()).collect();
    tracing::info!(endpoint = %config.endpoint, buttons = ?labels, "dashboard ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(config.render_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::info!("\n{}", dashboard.render());
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => press(&dashboard, line.trim()),
                    Ok(None) => stdin_open = false,
                    Err(err) => {
                        tracing::warn!(error = %err, "stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

fn press(dashboard: &Dashboard, input: &str) {
    if input.is_empty() {
        return;
    }
    let (label, message) = match input.split_once(char::is_whitespace) {
        Some((label, message)) => (label, Some(message.trim())),
        None => (input, None),
    };
    let Some(button) = dashboard.button(label) else {
        tracing::warn!(label, "no such button");
        return;
    };
    let delivery = match message {
        Some(message) => button.trigger_with(message),
        None => button.trigger(),
    };
    if delivery == Delivery::Dropped {
        tracing::warn!(label, status = %dashboard.status(), "device not connected; press ignored");
    }
}
