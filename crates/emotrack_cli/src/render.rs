use std::fmt::Write as _;

use emotrack_core::{AnalysisResult, JobPhase, JobView, SessionView};

pub fn job_line(view: &JobView) -> String {
    let file = view.file_name.as_deref().unwrap_or("-");
    match view.phase {
        JobPhase::Idle => format!("{file}: ready"),
        JobPhase::Submitting => format!("{file}: uploading"),
        JobPhase::Polling => format!("{file}: analyzing {:>3}%", view.progress),
        JobPhase::Completed => format!("{file}: done"),
        JobPhase::Failed => format!(
            "{file}: failed: {}",
            view.error_message.as_deref().unwrap_or("unknown error")
        ),
    }
}

pub fn session_line(view: &SessionView) -> String {
    match &view.identity {
        Some(identity) => format!("Signed in as {} (user {})", identity.email, identity.user_id),
        None => "Not signed in".to_string(),
    }
}

pub fn analysis_report(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dominant emotion: {}", result.dominant_emotion);
    if let Some(last) = &result.last_message_emotion {
        let _ = writeln!(out, "Last messages:    {last}");
    }
    if let Some(lines) = result.total_lines_analyzed {
        let _ = writeln!(out, "Lines analyzed:   {lines}");
    }

    let mut shares: Vec<_> = result.distribution.iter().collect();
    shares.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !shares.is_empty() {
        let _ = writeln!(out, "Distribution:");
        for (emotion, share) in shares {
            let _ = writeln!(out, "  {emotion:<10} {:>5.1}%", share * 100.0);
        }
    }

    if let Some(advice) = &result.advice {
        let _ = writeln!(out, "Advice: {}", advice.strategy_title);
        if !advice.strategy_content.is_empty() {
            let _ = writeln!(out, "  {}", advice.strategy_content);
        }
        if !advice.suggested_tone.is_empty() {
            let _ = writeln!(out, "  Tone: {}", advice.suggested_tone);
        }
        if !advice.reply_tip.is_empty() {
            let _ = writeln!(out, "  Tip:  {}", advice.reply_tip);
        }
    }

    for line in &result.recent_context {
        let _ = writeln!(out, "  [{}] {}", line.emotion, line.text);
    }
    out
}
