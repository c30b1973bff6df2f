//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::application::{Event, EventKind, Motion, Payload};
use crate::domain::PlacedNode;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One line per block: path, corner, size and color.
pub fn placement_line(node: &PlacedNode) -> String {
    format!(
        "{:<14} left {:>7.3} bottom {:>7.3}  {:.3} x {:.3}  {}",
        format!("{:?}", node.path),
        node.left,
        node.bottom,
        node.width,
        node.height,
        node.color
    )
}

/// One line per event: index, kind, duration and its payloads.
pub fn event_line(index: usize, event: &Event) -> String {
    let kind = match event.kind {
        EventKind::Transition => event.kind.to_string().blue(),
        EventKind::Sound => event.kind.to_string().magenta(),
        EventKind::Wait => event.kind.to_string().dimmed(),
    };
    let payloads: Vec<String> = event.payloads.iter().map(payload_text).collect();
    format!(
        "{:>4} {:<10} {:>5.2}s  {}",
        index,
        kind,
        event.duration,
        payloads.join(", ")
    )
}

fn payload_text(payload: &Payload) -> String {
    match payload {
        Payload::Shape { target, motion } => format!("{} {}", target, motion_text(motion)),
        Payload::Sound { sample, gain } => format!("play {} ({:+} dB)", sample, gain),
        Payload::Label {
            indicator, value, ..
        } => format!("{} = {}", indicator, value.yellow()),
    }
}

fn motion_text(motion: &Motion) -> String {
    match motion {
        Motion::Create => "create".into(),
        Motion::Uncreate { subtree: true } => "uncreate subtree".into(),
        Motion::Uncreate { subtree: false } => "uncreate".into(),
        Motion::Place { left, bottom } => format!("place ({:.3}, {:.3})", left, bottom),
        Motion::Shift { dx, dy } => format!("shift ({:.3}, {:.3})", dx, dy),
        Motion::Rotate { angle } => format!("rotate {:.3}", angle),
        Motion::Indicate => "indicate".into(),
        Motion::Recolor { color } => format!("recolor {}", color),
        Motion::ScaleWidth { factor } => format!("scale width x{:.3}", factor),
        Motion::ScaleHeight { factor } => format!("scale height x{:.3}", factor),
        Motion::Scale { factor } => format!("scale x{:.3}", factor),
        Motion::SwapWith { other } => format!("swap with {:?}", other),
        Motion::AlignTop => "align to parent top".into(),
        Motion::CopyTo { to } => format!("copy to {:?}", to),
        Motion::Wiggle => "wiggle".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ShapeRef;

    #[test]
    fn given_wait_event_when_formatting_then_shows_duration() {
        colored::control::set_override(false);
        let line = event_line(3, &Event::wait(0.5));

        assert!(line.contains("wait"));
        assert!(line.contains("0.50s"));
    }

    #[test]
    fn given_shape_payload_when_formatting_then_names_target_and_motion() {
        colored::control::set_override(false);
        let event = Event::transition(
            0.1,
            vec![Payload::shape(
                ShapeRef::Node(vec![0, 1]),
                Motion::Uncreate { subtree: true },
            )],
        );

        let line = event_line(0, &event);

        assert!(line.contains("node[0, 1] uncreate subtree"), "{line}");
    }
}
