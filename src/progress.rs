use std::io;
use std::io::Write;

// Prints a throttled progress bar to stderr, leaving stdout free.
pub struct Progress {
    total_work: u64,
    current_progress: u64,
    bar_display_length: u32,
    last_update_percentage: f32,
}

const UPDATE_DELTA: f32 = 0.009_f32;

const PROGRESS_PREFIX: &str = "\rProgress: <";
const FILLED_CHAR: char = '#';
const EMPTY_CHAR: char = ' ';

impl Progress {
    pub fn new(total_work: u64, bar_display_length: u32) -> Progress {
        Progress {
            total_work: total_work,
            current_progress: 0_u64,
            bar_display_length: bar_display_length,
            last_update_percentage: 0.0_f32,
        }
    }

    pub fn update(&mut self, progress_made: u64) {
        self.current_progress =
            std::cmp::min(self.current_progress + progress_made, self.total_work);
        let new_percentage = (self.current_progress as f64 / self.total_work as f64) as f32;
        if (new_percentage - self.last_update_percentage).abs() > UPDATE_DELTA {
            self.print_progress(new_percentage);
        }
    }

    pub fn done(&mut self) {
        self.print_progress(1.0_f32);
        eprintln!();
    }

    fn print_progress(&mut self, percentage: f32) {
        self.last_update_percentage = percentage;

        let num_filled = (percentage * self.bar_display_length as f32).round() as u32;
        let mut p = String::with_capacity(
            PROGRESS_PREFIX.len() + self.bar_display_length as usize + 8_usize,
        );

        p.push_str(PROGRESS_PREFIX);
        for _ in 0..num_filled {
            p.push(FILLED_CHAR);
        }
        for _ in 0..(self.bar_display_length - num_filled) {
            p.push(EMPTY_CHAR);
        }
        p.push_str(format!("> ({}%)", (percentage * 100.0_f32).round() as u32).as_str());

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        // Progress display is best effort; rendering continues even if
        // the terminal goes away.
        let _ = handle.write(p.as_bytes());
        let _ = handle.flush();
    }
}
