use crate::ledger::{LedgerError, WorkSession, aggregate};
use crate::timeclock::ClockError;
use crate::utils::time::{format_hours, format_time, local_date};
use chrono::{FixedOffset, NaiveDate};
use poise::serenity_prelude as serenity;

pub fn format_session_status(session: Option<&WorkSession>, offset: &FixedOffset) -> String {
    let Some(session) = session else {
        return "Not clocked in".to_string();
    };

    let mut status = String::new();
    status.push_str(&format!(
        "🟢 **Clocked in**: {} @ {}\n",
        format_time(session.clock_in, offset),
        session.clock_in_location
    ));

    for (i, entry) in session.breaks.iter().enumerate() {
        match entry.end {
            Some(end) => status.push_str(&format!(
                "☕ Break #{}: {} → {}\n",
                i + 1,
                format_time(entry.start, offset),
                format_time(end, offset)
            )),
            None => status.push_str(&format!(
                "☕ Break #{}: {} → **on break**\n",
                i + 1,
                format_time(entry.start, offset)
            )),
        }
    }

    if let Some(sample) = session.last_location() {
        status.push_str(&format!(
            "📍 Last location: {} ({})\n",
            sample.address,
            format_time(sample.recorded_at, offset)
        ));
    }

    if let Some(clock_out) = session.clock_out {
        status.push_str(&format!(
            "🔴 **Clocked out**: {} | {}\n",
            format_time(clock_out, offset),
            format_hours(session.total_hours)
        ));
    }

    status.push_str(&format!("🆔 `{}`", session.id));
    status
}

/// Full history of sessions: every break and every location sample.
pub fn format_session_history(sessions: &[WorkSession], offset: &FixedOffset) -> String {
    if sessions.is_empty() {
        return "No sessions recorded".to_string();
    }

    let mut history = String::new();
    for session in sessions {
        history.push_str(&format!(
            "📅 **{}** {} → {} ({})\n",
            session.clock_in.with_timezone(offset).format("%Y-%m-%d"),
            format_time(session.clock_in, offset),
            session
                .clock_out
                .map(|t| format_time(t, offset))
                .unwrap_or_else(|| "open".to_string()),
            format_hours(session.total_hours)
        ));
        history.push_str(&format!(
            "   🟢 {} | 🔴 {}\n",
            session.clock_in_location,
            session.clock_out_location.as_deref().unwrap_or("-")
        ));

        for entry in &session.breaks {
            let end = entry
                .end
                .map(|t| format_time(t, offset))
                .unwrap_or_else(|| "not ended".to_string());
            history.push_str(&format!(
                "   ☕ {} → {}\n",
                format_time(entry.start, offset),
                end
            ));
        }

        for sample in &session.locations {
            history.push_str(&format!(
                "   📍 {} {} ({:.5}, {:.5})\n",
                format_time(sample.recorded_at, offset),
                sample.address,
                sample.latitude,
                sample.longitude
            ));
        }

        history.push_str(&format!("   🆔 `{}`\n\n", session.id));
    }

    history.push_str(&format!(
        "🎯 **Total**: {}",
        format_hours(aggregate::total_hours(sessions))
    ));
    history
}

pub fn format_sessions_summary(sessions: &[WorkSession], offset: &FixedOffset) -> String {
    if sessions.is_empty() {
        return "No sessions in this period".to_string();
    }

    let mut summary = String::new();
    let mut current_date: Option<NaiveDate> = None;
    let mut day: Vec<&WorkSession> = Vec::new();

    for session in sessions {
        let date = local_date(session.clock_in, offset);

        if current_date != Some(date) {
            push_day_total(&mut summary, current_date, &day);
            day.clear();
            current_date = Some(date);
            summary.push_str(&format!("📅 **{}**\n", date.format("%Y-%m-%d (%a)")));
        }
        day.push(session);

        summary.push_str(&format!("   🟢 {}", format_time(session.clock_in, offset)));
        match session.clock_out {
            Some(clock_out) => summary.push_str(&format!(
                " → 🔴 {} ({})\n",
                format_time(clock_out, offset),
                format_hours(session.total_hours)
            )),
            None => summary.push_str(" → ⚠️ **still open**\n"),
        }
    }
    push_day_total(&mut summary, current_date, &day);

    summary.push_str(&format!(
        "🎯 **Total**: {}",
        format_hours(aggregate::total_hours(sessions))
    ));

    summary
}

fn push_day_total(summary: &mut String, date: Option<NaiveDate>, day: &[&WorkSession]) {
    if let Some(date) = date {
        summary.push_str(&format!(
            "   📊 **{} total**: {}\n\n",
            date.format("%m/%d"),
            format_hours(aggregate::total_hours(day.iter().copied()))
        ));
    }
}

/// User-facing wording for service failures.
pub fn describe_clock_error(error: &ClockError) -> String {
    match error {
        ClockError::Ledger(LedgerError::PreconditionViolation(_)) => {
            "You are already clocked in. Use `/clockout` first.".to_string()
        }
        ClockError::NoActiveSession(_) => "No active session. Use `/clockin` first.".to_string(),
        ClockError::NoOpenBreak(_) => "You are not on a break.".to_string(),
        ClockError::Ledger(e) => e.to_string(),
        ClockError::Storage(_) => "Something went wrong while saving. Please try again.".to_string(),
    }
}

/// Discord rejects embed descriptions longer than this many characters.
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Cuts text to fit an embed description, marking the cut with an ellipsis.
pub fn clip_description(text: &str) -> String {
    if text.chars().count() <= EMBED_DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(EMBED_DESCRIPTION_LIMIT - 1).collect();
    clipped.push('…');
    clipped
}

pub fn format_error_message(error: &str) -> String {
    format!("❌ **Error**: {}", error)
}

pub fn format_success_message(message: &str) -> String {
    format!("✅ {}", message)
}

pub fn format_info_message(message: &str) -> String {
    format!("ℹ️ {}", message)
}

// Embed utility functions
pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0xff0000) // Red
        .timestamp(chrono::Utc::now())
}

pub fn create_info_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x3498db) // Blue
        .timestamp(chrono::Utc::now())
}

pub fn create_status_embed(
    username: &str,
    session: Option<&WorkSession>,
    offset: &FixedOffset,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("📊 Status")
        .description(format_session_status(session, offset))
        .color(0x3498db) // Blue
        .author(serenity::CreateEmbedAuthor::new(format!("{}'s status", username)))
        .timestamp(chrono::Utc::now())
}

pub fn create_report_embed(
    username: &str,
    title: &str,
    date_range: &str,
    sessions: &[WorkSession],
    offset: &FixedOffset,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("📅 {}", title))
        .description(format_sessions_summary(sessions, offset))
        .color(0x9b59b6) // Purple
        .author(serenity::CreateEmbedAuthor::new(format!("{}'s report", username)))
        .footer(serenity::CreateEmbedFooter::new(date_range))
        .timestamp(chrono::Utc::now())
}
