use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;

use crate::audio::DEFAULT_MASTER_GAIN;
use crate::pipeline::Tempo;
use crate::sequencer::SchedulerConfig;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    transport: TransportConfig,
    #[serde(default)]
    scheduler: SchedulerFile,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Deserialize, Default)]
struct TransportConfig {
    bpm: Option<f64>,
}

#[derive(Deserialize, Default)]
struct SchedulerFile {
    lookahead_ms: Option<u64>,
    schedule_ahead_secs: Option<f64>,
    start_offset_secs: Option<f64>,
}

#[derive(Deserialize, Default)]
struct AudioConfig {
    master_gain: Option<f32>,
}

#[derive(Deserialize, Default)]
struct LoggingConfig {
    level: Option<String>,
}

// startup settings: the embedded defaults with the user's file layered on top.
pub struct Config {
    file: ConfigFile,
}

impl Config {
    pub fn load() -> Self {
        let mut base = parse(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is malformed: {e}");
            ConfigFile::default()
        });

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match parse(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config { file: base }
    }

    // embedded defaults plus one overriding document, no filesystem
    #[cfg(test)]
    fn layered(user: &str) -> Result<Self, toml::de::Error> {
        let mut base = parse(DEFAULT_CONFIG)?;
        merge(&mut base, parse(user)?);
        Ok(Config { file: base })
    }

    pub fn tempo(&self) -> Tempo {
        self.file.transport.bpm.map(Tempo::new).unwrap_or_default()
    }

    // look-ahead timing. A schedule-ahead window no longer than the wake
    // interval would leave gaps, so that combination falls back to the defaults.
    pub fn scheduler(&self) -> SchedulerConfig {
        let fallback = SchedulerConfig::default();
        let s = &self.file.scheduler;
        let config = SchedulerConfig {
            lookahead: s.lookahead_ms.map(Duration::from_millis).unwrap_or(fallback.lookahead),
            schedule_ahead: s.schedule_ahead_secs.unwrap_or(fallback.schedule_ahead),
            start_offset: s.start_offset_secs.unwrap_or(fallback.start_offset).max(0.0),
        };

        let window_ok = config.schedule_ahead.is_finite()
            && config.start_offset.is_finite()
            && !config.lookahead.is_zero()
            && config.schedule_ahead > config.lookahead.as_secs_f64();
        if window_ok {
            config
        } else {
            log::warn!(
                target: "config",
                "schedule_ahead {}s must exceed lookahead {:?}, using defaults",
                config.schedule_ahead,
                config.lookahead
            );
            fallback
        }
    }

    pub fn master_gain(&self) -> f32 {
        match self.file.audio.master_gain {
            Some(g) if g.is_finite() => g.clamp(0.0, 1.0),
            _ => DEFAULT_MASTER_GAIN,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.file
            .logging
            .level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LevelFilter::Warn)
    }
}

fn parse(contents: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(contents)
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pocketbeat"))
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.transport.bpm.is_some() {
        base.transport.bpm = user.transport.bpm;
    }
    if user.scheduler.lookahead_ms.is_some() {
        base.scheduler.lookahead_ms = user.scheduler.lookahead_ms;
    }
    if user.scheduler.schedule_ahead_secs.is_some() {
        base.scheduler.schedule_ahead_secs = user.scheduler.schedule_ahead_secs;
    }
    if user.scheduler.start_offset_secs.is_some() {
        base.scheduler.start_offset_secs = user.scheduler.start_offset_secs;
    }
    if user.audio.master_gain.is_some() {
        base.audio.master_gain = user.audio.master_gain;
    }
    if user.logging.level.is_some() {
        base.logging.level = user.logging.level;
    }
}
