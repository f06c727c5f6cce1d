// Desktop stand-ins for the platform hosts
//
// The notification host prints what Android would show. The task host hands
// out background tasks and revokes them after the configured budget, the way
// iOS fires its expiration handler.

use colored::*;
use imageflow_core::{
    BackgroundTaskHost, ExpirationToken, NotificationChannel, NotificationContent,
    NotificationHost, ProgressIndicator,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn progress_bar(indicator: &ProgressIndicator) -> String {
    const WIDTH: usize = 24;
    match indicator.fraction() {
        None => format!("[{}]", "~".repeat(WIDTH)),
        Some(fraction) => {
            let filled = (fraction * WIDTH as f64).round() as usize;
            format!("[{}{}]", "#".repeat(filled), ".".repeat(WIDTH - filled))
        }
    }
}

/// Prints notification traffic to stdout
pub struct ConsoleNotificationHost;

impl NotificationHost for ConsoleNotificationHost {
    fn create_channel(&self, channel: NotificationChannel) -> bool {
        println!(
            "  {} channel {} \"{}\" ({:?})",
            "+".green(),
            channel.id.bright_cyan(),
            channel.name,
            channel.importance
        );
        true
    }

    fn start_foreground(&self, notification_id: u32, content: NotificationContent) -> bool {
        println!(
            "  {} foreground #{} {}: {} {}",
            "▶".green(),
            notification_id,
            content.title.bold(),
            content.body,
            progress_bar(&content.progress).bright_yellow()
        );
        true
    }

    fn notify(&self, notification_id: u32, content: NotificationContent) -> bool {
        println!(
            "  {} notify     #{} {}: {} {}",
            "↻".cyan(),
            notification_id,
            content.title.bold(),
            content.body,
            progress_bar(&content.progress).bright_yellow()
        );
        true
    }

    fn stop_foreground(&self, notification_id: u32) -> bool {
        println!("  {} stop foreground #{}", "■".red(), notification_id);
        true
    }
}

/// Background task host with a fixed execution budget per task
pub struct SimulatedTaskHost {
    runtime: Handle,
    budget: Option<Duration>,
    next_id: Mutex<u64>,
    live: Arc<Mutex<HashSet<u64>>>,
}

impl SimulatedTaskHost {
    /// `budget` of `None` never revokes
    pub fn new(runtime: Handle, budget: Option<Duration>) -> Self {
        Self {
            runtime,
            budget,
            next_id: Mutex::new(0),
            live: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl BackgroundTaskHost for SimulatedTaskHost {
    fn begin_background_task(&self, name: String, expiration: Arc<ExpirationToken>) -> u64 {
        let task_id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            *next_id
        };
        self.live.lock().insert(task_id);

        println!(
            "  {} background task {} \"{}\"",
            "▶".green(),
            task_id,
            name.bright_cyan()
        );

        if let Some(budget) = self.budget {
            let live = self.live.clone();
            self.runtime.spawn(async move {
                tokio::time::sleep(budget).await;
                // Only expire tasks the app has not ended yet
                let still_live = live.lock().contains(&task_id);
                if still_live {
                    println!(
                        "  {} background task {} expired after {:?}",
                        "⚠".bright_red(),
                        task_id,
                        budget
                    );
                    expiration.fire();
                }
            });
        }

        task_id
    }

    fn end_background_task(&self, task_id: u64) {
        if self.live.lock().remove(&task_id) {
            println!("  {} end background task {}", "■".red(), task_id);
        }
    }
}
