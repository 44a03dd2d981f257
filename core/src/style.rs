use std::time::Duration;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::judging::verdict::{ProblemVerdict, SubtaskVerdict, TestVerdict, Verdict};

const TICK: char = '✔';
const CROSS: char = '✘';

/// `[✔] message` / `[✘] message` status line of a package check.
pub fn verification_status(message: &str, success: bool) {
    let sign = if success {
        TICK.to_string().green()
    } else {
        CROSS.to_string().red()
    };
    println!("[{}] {}", sign, message);
}

pub fn verification_success(message: &str) {
    verification_status(message, true);
}

pub fn verification_failed(message: &str) {
    verification_status(message, false);
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false;
    };
    match v.as_str() {
        "truecolor" | "24bit" => true,
        _ => false,
    }
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                TLE => Color::Red,
                RE => Color::Magenta,
            };
        }

        match self {
            AC => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            WA => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            TLE => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            RE => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
        }
    }
}

pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", verdict)
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

pub fn format_cpu_time(cpu_time: Option<Duration>) -> String {
    match cpu_time {
        Some(t) => format!("{:.2}s", t.as_secs_f64()),
        None => "-----".to_owned(),
    }
}

pub fn print_test_verdict_line(tv: &TestVerdict) {
    println!(
        "    {} {} [{}]",
        verdict_icon(tv.verdict),
        tv.test_name,
        format_cpu_time(tv.cpu_time),
    );
}

pub fn print_subtask_summary(sv: &SubtaskVerdict) {
    let times = elided_times(&sv.sorted_cpu_times());
    if times.is_empty() {
        println!("- Subtask {}, verdict = {}", sv.subtask_id, sv);
    } else {
        println!(
            "- Subtask {}, verdict = {} {}",
            sv.subtask_id,
            sv,
            times.as_str().dimmed(),
        );
    }
}

pub fn print_problem_total(name: &str, pv: &ProblemVerdict) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let bar = "━".repeat(cols as usize).blue().bold();
    println!("{}", bar);
    println!(
        "{}: total score = {:.2}",
        name.bright_yellow().bold(),
        pv.total_score,
    );
    println!("{}", bar);
}

/// CPU times as `[0.01 0.02 ... 0.88 0.90]`, eliding the middle when more
/// than 8 measurements exist.
fn elided_times(times: &[Duration]) -> String {
    if times.is_empty() {
        return String::new();
    }
    let fmt = |d: &Duration| format!("{:.2}", d.as_secs_f64());
    let shown: Vec<String> = if times.len() <= 8 {
        times.iter().map(fmt).collect()
    } else {
        times[..4]
            .iter()
            .map(fmt)
            .chain(std::iter::once("...".to_owned()))
            .chain(times[times.len() - 4..].iter().map(fmt))
            .collect()
    };
    format!("[{}]", shown.join(" "))
}
