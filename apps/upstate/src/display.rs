//! Output rendering for poll results and reports

use serde::Serialize;
use std::time::Duration;
use upstate_config::Config;
use upstate_progress::RecordSnapshot;

use crate::error::CliError;
use crate::simulate::SimulationReport;

/// Renders poller output and final results as text or JSON lines
#[derive(Debug, Clone, Copy)]
pub struct OutputRenderer {
    json: bool,
}

#[derive(Serialize)]
struct PollLine<'a> {
    poller: usize,
    snapshot: &'a RecordSnapshot,
}

impl OutputRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render_poll(&self, poller: usize, snapshot: &RecordSnapshot) -> Result<(), CliError> {
        if self.json {
            let line = serde_json::to_string(&PollLine { poller, snapshot })
                .map_err(upstate_errors::Error::from)?;
            println!("{line}");
        } else {
            println!("[poller {poller}] {}", describe(snapshot));
        }
        Ok(())
    }

    pub fn render_report(&self, report: &SimulationReport) -> Result<(), CliError> {
        if self.json {
            let line = serde_json::to_string(report).map_err(upstate_errors::Error::from)?;
            println!("{line}");
            return Ok(());
        }

        println!();
        println!("transfer   {}", report.transfer_id);
        println!("status     {}", report.status);
        println!("received   {} of {} bytes", report.bytes_read, report.bytes_total);
        if let Some(outcome) = &report.outcome {
            println!("outcome    {}", outcome.message());
            if let Some(code) = outcome.status_code() {
                println!("code       {code}");
            }
        }
        match &report.late_poll {
            Some(snapshot) => println!("late poll  {}", describe(snapshot)),
            None => println!("late poll  not found"),
        }
        Ok(())
    }

    pub fn render_config(&self, config: &Config) -> Result<(), CliError> {
        let rendered = if self.json {
            serde_json::to_string_pretty(config).map_err(upstate_errors::Error::from)?
        } else {
            toml::to_string_pretty(config).map_err(|e| {
                upstate_errors::Error::internal(format!("failed to render config: {e}"))
            })?
        };
        println!("{rendered}");
        Ok(())
    }
}

/// One-line human description of a snapshot
pub fn describe(snapshot: &RecordSnapshot) -> String {
    let eta = snapshot
        .time_remaining
        .map_or_else(|| "-".to_string(), format_duration);
    format!(
        "{:>5.1}%  {}/{} bytes  {}/s  eta {}  {}",
        snapshot.fraction_complete * 100.0,
        snapshot.bytes_read,
        snapshot.bytes_total,
        format_bytes(snapshot.bytes_per_sec),
        eta,
        snapshot.status,
    )
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{}s", secs, duration.subsec_millis() / 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_scale_to_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn durations_switch_to_minutes() {
        assert_eq!(format_duration(Duration::from_millis(2_500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
    }
}
