use crate::error::{Error, Result};
use crate::services::reporting_service::{UserExportRow, UserReport};

/// Renders export artifacts. Pure string building over already-queried
/// data; the queue worker decides where the bytes go.
pub struct ExportService;

impl ExportService {
    /// Per-user performance report: summary, per-subject breakdown, score
    /// timeline, then the individual attempts.
    pub fn render_user_report_csv(report: &UserReport) -> Result<String> {
        // The report mixes section headers with data rows, so record widths vary.
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(["Quiz Master - Performance Report"])?;
        writer.write_record([format!("User: {}", report.user_name).as_str()])?;
        writer.write_record([format!("Generated: {}", report.generated_at.to_rfc3339()).as_str()])?;
        writer.write_record([""])?;

        writer.write_record(["Summary"])?;
        writer.write_record(["Total Quizzes", &report.stats.total_quizzes.to_string()])?;
        writer.write_record(["Average Score", &format!("{}%", report.stats.average_score)])?;
        writer.write_record(["Best Score", &format!("{}%", report.stats.best_score)])?;
        writer.write_record([""])?;

        writer.write_record(["Subject Performance"])?;
        writer.write_record(["Subject", "Average Score", "Attempts"])?;
        for subject in &report.stats.subject_performance {
            writer.write_record([
                subject.subject_name.as_str(),
                &format!("{:.2}%", subject.average_score),
                &subject.attempts.to_string(),
            ])?;
        }
        writer.write_record([""])?;

        writer.write_record(["Quiz Attempts"])?;
        writer.write_record(["Quiz ID", "Subject", "Chapter", "Date Attempted", "Score"])?;
        for score in &report.scores {
            writer.write_record([
                score.quiz_id.to_string().as_str(),
                &score.subject_name,
                &score.chapter_name,
                &score.time_stamp_of_attempt.to_rfc3339(),
                &format!("{}%", score.total_scored),
            ])?;
        }

        finish(writer)
    }

    /// Minimal HTML rendition of the same report, for users whose preferred
    /// report format is `html`.
    pub fn render_user_report_html(report: &UserReport) -> String {
        let mut rows = String::new();
        for score in &report.scores {
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}%</td></tr>\n",
                score.quiz_id,
                escape(&score.subject_name),
                escape(&score.chapter_name),
                score.time_stamp_of_attempt.format("%Y-%m-%d %H:%M"),
                score.total_scored,
            ));
        }

        let mut subjects = String::new();
        for subject in &report.stats.subject_performance {
            subjects.push_str(&format!(
                "<tr><td>{}</td><td>{:.2}%</td><td>{}</td></tr>\n",
                escape(&subject.subject_name),
                subject.average_score,
                subject.attempts,
            ));
        }

        format!(
            "<!DOCTYPE html>\n<html><head><title>Quiz Master Report</title></head><body>\n\
             <h1>Performance Report: {user}</h1>\n\
             <p>Generated {generated}</p>\n\
             <h2>Summary</h2>\n\
             <ul><li>Total quizzes: {total}</li><li>Average score: {avg}%</li><li>Best score: {best}%</li></ul>\n\
             <h2>Subject Performance</h2>\n\
             <table><tr><th>Subject</th><th>Average</th><th>Attempts</th></tr>\n{subjects}</table>\n\
             <h2>Quiz Attempts</h2>\n\
             <table><tr><th>Quiz</th><th>Subject</th><th>Chapter</th><th>Date</th><th>Score</th></tr>\n{rows}</table>\n\
             </body></html>\n",
            user = escape(&report.user_name),
            generated = report.generated_at.format("%Y-%m-%d %H:%M UTC"),
            total = report.stats.total_quizzes,
            avg = report.stats.average_score,
            best = report.stats.best_score,
            subjects = subjects,
            rows = rows,
        )
    }

    /// Admin-wide export: one row per registered user with aggregate
    /// performance.
    pub fn render_admin_export_csv(rows: &[UserExportRow]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "User ID",
            "Username",
            "Full Name",
            "Email",
            "Quizzes Taken",
            "Average Score",
            "Best Score",
            "Last Attempt",
        ])?;
        for row in rows {
            writer.write_record([
                row.user_id.to_string().as_str(),
                &row.username,
                &row.full_name,
                row.email.as_deref().unwrap_or(""),
                &row.quizzes_taken.to_string(),
                &format!("{:.2}", row.average_score),
                &format!("{:.1}", row.best_score),
                &row
                    .last_attempt
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
            ])?;
        }
        finish(writer)
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV writer: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV was not UTF-8: {}", e)))
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reporting_service::{ScoreDetail, SubjectPerformance, UserStats};
    use chrono::{NaiveDate, Utc};

    fn sample_report() -> UserReport {
        let attempt = ScoreDetail {
            score_id: 1,
            user_id: 7,
            user_name: "Ada Lovelace".to_string(),
            quiz_id: 3,
            date_of_quiz: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            chapter_name: "Limits".to_string(),
            subject_name: "Calculus".to_string(),
            total_scored: 75.0,
            time_stamp_of_attempt: Utc::now(),
        };
        UserReport {
            user_id: 7,
            user_name: "Ada Lovelace".to_string(),
            generated_at: Utc::now(),
            stats: UserStats {
                total_quizzes: 1,
                average_score: 75.0,
                best_score: 75.0,
                recent_attempts: vec![attempt.clone()],
                subject_performance: vec![SubjectPerformance {
                    subject_id: 1,
                    subject_name: "Calculus".to_string(),
                    average_score: 75.0,
                    attempts: 1,
                }],
            },
            scores: vec![attempt],
        }
    }

    #[test]
    fn user_report_csv_contains_summary_and_attempts() {
        let csv = ExportService::render_user_report_csv(&sample_report()).expect("csv");
        assert!(csv.contains("Quiz Master - Performance Report"));
        assert!(csv.contains("User: Ada Lovelace"));
        assert!(csv.contains("Total Quizzes,1"));
        assert!(csv.contains("Calculus"));
        assert!(csv.contains("75%"));
    }

    #[test]
    fn html_report_escapes_markup_in_names() {
        let mut report = sample_report();
        report.user_name = "Ada <script>".to_string();
        let html = ExportService::render_user_report_html(&report);
        assert!(html.contains("Ada &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn admin_export_renders_one_row_per_user() {
        let rows = vec![
            UserExportRow {
                user_id: 1,
                username: "ada".to_string(),
                full_name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                quizzes_taken: 4,
                average_score: 81.25,
                best_score: 100.0,
                last_attempt: Some(Utc::now()),
            },
            UserExportRow {
                user_id: 2,
                username: "grace".to_string(),
                full_name: "Grace Hopper".to_string(),
                email: None,
                quizzes_taken: 0,
                average_score: 0.0,
                best_score: 0.0,
                last_attempt: None,
            },
        ];
        let csv = ExportService::render_admin_export_csv(&rows).expect("csv");
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("ada@example.com"));
        assert!(lines[2].starts_with("2,grace"));
    }
}
