use std::{collections::HashMap, time::Instant};

use ansi_term::Colour;

#[derive(Clone, Debug)]
pub struct Logger {
    /// 10 is everything and 0 is nothing
    level: u8,
    start_times: HashMap<String, Instant>,
}

impl Logger {

    pub fn new(level: u8) -> Self {
        Logger {
            level: level.min(10),
            start_times: HashMap::new(),
        }
    }

    /// A logger that never prints anything
    pub fn silent() -> Self { Logger::new(0) }

    pub fn level(&self) -> u8 { self.level }

    pub fn enabled(&self, level: u8) -> bool { level > 0 && level <= self.level }

    /// Messages go to stderr so that stdout can carry machine-readable output
    pub fn log(&self, level: u8, msg: &str) {
        if self.enabled(level) {
            eprintln!("{}", Colour::Fixed(244).paint(msg));
        }
    }

    pub fn log_lazy(&self, level: u8, msg: impl FnOnce() -> String) {
        if self.enabled(level) {
            self.log(level, &msg());
        }
    }

    pub fn time_start(&mut self, _level: u8, name: &str) {
        self.start_times.insert(name.to_string(), Instant::now());
    }

    pub fn time_end(&mut self, level: u8, name: &str) {
        if let Some(start) = self.start_times.remove(name) {
            let elapsed = start.elapsed();
            self.log(level, &format!(
                "{}: {}.{:03}",
                name, elapsed.as_secs(), elapsed.subsec_millis()
            ));
        } else { panic!("time_end called for non-existing timing string") }
    }
}

impl Default for Logger {
    fn default() -> Self { Logger::silent() }
}
