//! Colored terminal rendering for nowcal-core types.

use chrono::{DateTime, Local, Utc};
use nowcal_core::{RankedEvent, Relevance, RelevantList};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Relevance {
    fn render(&self) -> String {
        match self {
            Relevance::Ongoing => "now".green().bold().to_string(),
            Relevance::Upcoming { minutes } => {
                format!("in {}", format_minutes(*minutes)).cyan().to_string()
            }
            Relevance::RecentlyEnded { minutes } => {
                format!("ended {} ago", format_minutes(*minutes))
                    .dimmed()
                    .to_string()
            }
        }
    }
}

impl Render for RankedEvent {
    fn render(&self) -> String {
        let occ = &self.event.occurrence;
        let tag = format!("[{}]", self.event.source.name);
        let mut line = format!(
            "{} {} {} {}",
            format_span(occ.start, occ.end),
            occ.title(),
            tag.dimmed(),
            self.relevance.render()
        );
        if let Some(location) = occ.location.as_deref().filter(|l| !l.is_empty()) {
            line.push_str(&format!("\n{:>15}{}", "", location.dimmed()));
        }
        line
    }
}

/// The ranked list grouped as Now / Upcoming / Just ended, numbered in rank order.
pub fn render_relevant_list(list: &RelevantList) -> String {
    if list.is_empty() {
        return "No events right now".dimmed().to_string();
    }

    let groups: [(&str, fn(&Relevance) -> bool); 3] = [
        ("Now", |r| matches!(r, Relevance::Ongoing)),
        ("Upcoming", |r| matches!(r, Relevance::Upcoming { .. })),
        ("Just ended", |r| matches!(r, Relevance::RecentlyEnded { .. })),
    ];

    let mut sections = Vec::new();
    for (title, belongs) in groups {
        let lines: Vec<String> = list
            .events
            .iter()
            .enumerate()
            .filter(|(_, ranked)| belongs(&ranked.relevance))
            .map(|(i, ranked)| format!("  {:>2}. {}", i + 1, ranked.render()))
            .collect();

        if !lines.is_empty() {
            sections.push(format!("{}\n{}", title.bold(), lines.join("\n")));
        }
    }

    sections.join("\n\n")
}

/// One-line plain label, for prompts that cannot take colors.
pub fn plain_label(ranked: &RankedEvent) -> String {
    let occ = &ranked.event.occurrence;
    format!(
        "{} {} [{}] ({})",
        format_span(occ.start, occ.end),
        occ.title(),
        ranked.event.source.name,
        ranked.relevance.label()
    )
}

fn format_span(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    let local = |t: Option<DateTime<Utc>>| {
        t.map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    };
    format!("{}-{}", local(start), local(end))
}

/// "45m", "2h", "3h 5m"
fn format_minutes(minutes: i64) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(185), "3h 5m");
    }

    #[test]
    fn test_empty_list() {
        let out = render_relevant_list(&RelevantList::default());
        assert!(out.contains("No events right now"));
    }
}
